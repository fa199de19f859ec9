//! The candidate-solution types the orchestrator threads through its loop,
//! plus the externally-facing `GeneratedPlan` assembled at the end of a run.

use serde::{Deserialize, Serialize};

use crate::models::room::{EnrichedRoom, Room};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    /// Penalty applied per occurrence by the regulatory scorer.
    pub fn regulatory_penalty(self) -> f64 {
        match self {
            Severity::Critical => 0.20,
            Severity::Major => 0.10,
            Severity::Minor => 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    Warn,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceItem {
    pub rule: String,
    pub status: ComplianceStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorResult {
    pub violations: Vec<Violation>,
    pub items: Vec<ComplianceItem>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critique {
    pub spatial_efficiency: f64,
    pub circulation_quality: f64,
    pub natural_lighting: f64,
    pub privacy_gradient: f64,
    pub aesthetic_balance: f64,
    pub overall_confidence: f64,
    pub critiques: Vec<String>,
    pub strengths: Vec<String>,
}

impl Critique {
    /// Clamp every subscore into [0,1]; the source critic occasionally
    /// returns values slightly outside that range and the normative
    /// resolution is to clamp rather than fail the run.
    pub fn clamped(mut self) -> Self {
        self.spatial_efficiency = self.spatial_efficiency.clamp(0.0, 1.0);
        self.circulation_quality = self.circulation_quality.clamp(0.0, 1.0);
        self.natural_lighting = self.natural_lighting.clamp(0.0, 1.0);
        self.privacy_gradient = self.privacy_gradient.clamp(0.0, 1.0);
        self.aesthetic_balance = self.aesthetic_balance.clamp(0.0, 1.0);
        self.overall_confidence = self.overall_confidence.clamp(0.0, 1.0);
        self.critiques.truncate(5);
        self.strengths.truncate(5);
        self
    }

    /// Composite spatial subscore fed into the scorer, averaging the four
    /// plan-shape dimensions and excluding `overall_confidence` (which the
    /// scorer consumes separately as the fourth weighted input).
    pub fn spatial_subscore(&self) -> f64 {
        (self.spatial_efficiency
            + self.circulation_quality
            + self.natural_lighting
            + self.privacy_gradient
            + self.aesthetic_balance)
            / 5.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdownEntry {
    pub category: String,
    pub weight: f64,
    pub raw_score: f64,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanScore {
    pub final_score: f64,
    pub breakdown: Vec<ScoreBreakdownEntry>,
    pub passes_threshold: bool,
}

/// The orchestrator's current candidate solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanGraph {
    pub rooms: Vec<EnrichedRoom>,
    pub total_area: f64,
    pub built_up_area: f64,
    pub circulation_area: f64,
    pub setback_area: f64,
    pub outdoor_area: f64,
    pub plot_coverage_ratio: f64,
    pub design_log: Vec<String>,
    pub adjacencies: Vec<crate::models::config::AdjacencyPreference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub plan_snapshot: FloorPlanGraph,
    pub regulatory: ValidatorResult,
    pub cultural: ValidatorResult,
    pub critique: Critique,
    pub score: PlanScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    pub material: String,
    pub quantity: f64,
    pub unit: String,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl Default for CostRange {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0, currency: "USD".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FurnitureItem {
    pub room_id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    pub rotation_degrees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPartition {
    pub floor_number: u32,
    pub floor_label: String,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compliance {
    pub regulatory: Vec<ComplianceItem>,
    pub cultural: Vec<ComplianceItem>,
}

/// The object surfaced at `completed.data.finalPlan` and in status
/// responses. This shape is authoritative for any external persistence
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub design_log: Vec<String>,
    pub rooms: Vec<Room>,
    pub total_area: f64,
    pub built_up_area: f64,
    pub plot_coverage_ratio: f64,
    pub compliance: Compliance,
    pub bom: Vec<BomLine>,
    pub total_cost_range: CostRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furniture: Option<Vec<FurnitureItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<Vec<FloorPartition>>,
}
