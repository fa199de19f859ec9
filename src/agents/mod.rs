//! Agents: six thin executors sharing one contract.
//!
//! The role set is closed: each agent is a value implementing `Agent<In,
//! Out>` for one fixed input/output pair, not an open-ended dynamic-dispatch
//! hierarchy.

pub mod cost;
pub mod critic;
pub mod furniture;
pub mod input;
pub mod refinement;
pub mod spatial;

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("llm call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("agent produced output that failed post-processing validation: {0}")]
    PostProcessing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub agent_name: String,
    pub model_used: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
}

pub struct AgentOutput<T> {
    pub data: T,
    pub metadata: AgentMetadata,
}

/// Shared contract: `execute(typedInput) -> Result<{data, metadata}>`.
#[async_trait]
pub trait Agent<In: Send + Sync, Out: Send + Sync> {
    fn name(&self) -> &'static str;

    async fn execute(&self, input: In) -> Result<AgentOutput<Out>, AgentError>;
}

/// Helper for agents to build their metadata consistently: start a timer,
/// run the body, and attach the elapsed duration plus whatever the body
/// reports for model/tokens.
pub(crate) fn timed<T>(name: &'static str, model_used: String, token_count: Option<u64>, started: Instant, data: T) -> AgentOutput<T> {
    AgentOutput {
        data,
        metadata: AgentMetadata {
            agent_name: name.to_string(),
            model_used,
            duration_ms: started.elapsed().as_millis() as u64,
            token_count,
        },
    }
}
