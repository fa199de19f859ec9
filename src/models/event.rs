//! Wire-format progress events streamed to clients over SSE.
//!
//! A closed, internally-tagged enum (`#[serde(tag = "type", content =
//! "data")]`) so each event serializes to a flat `{"type": "...", "data":
//! {...}}` object. Only the terminal variants (`Completed`, `Error`) end a
//! stream; every other variant may be followed by more events.

use serde::{Deserialize, Serialize};

use crate::models::plan::{ComplianceItem, GeneratedPlan, PlanScore, ValidatorResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStartData {
    pub agent: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCompleteData {
    pub agent: String,
    pub model: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationStartData {
    pub iteration: u32,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationUpdateData {
    pub category: String,
    pub violations: Vec<crate::models::plan::Violation>,
    pub items: Vec<ComplianceItem>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdateData {
    pub iteration: u32,
    pub score: PlanScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoeRoutingData {
    pub agent: String,
    pub requested_model: String,
    pub used_model: String,
    pub fallback_depth: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedData {
    pub final_plan: GeneratedPlan,
    pub final_score: f64,
    pub converged: bool,
    pub iteration_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
    pub reason: String,
}

/// The closed set of progress events streamed to subscribers of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProgressEvent {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "agent_start")]
    AgentStart(AgentStartData),
    #[serde(rename = "agent_complete")]
    AgentComplete(AgentCompleteData),
    #[serde(rename = "iteration_start")]
    IterationStart(IterationStartData),
    #[serde(rename = "violation_update")]
    ViolationUpdate(ViolationUpdateData),
    #[serde(rename = "score_update")]
    ScoreUpdate(ScoreUpdateData),
    #[serde(rename = "moe_routing")]
    MoeRouting(MoeRoutingData),
    #[serde(rename = "completed")]
    Completed(CompletedData),
    #[serde(rename = "error")]
    Error(ErrorData),
}

impl ProgressEvent {
    /// A terminal event ends the stream; late subscribers of a finished job
    /// are replayed exactly this event once, per the progress hub contract.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed(_) | ProgressEvent::Error(_))
    }

    /// Render as the wire line-oriented SSE frame `data: <JSON>\n\n`.
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
