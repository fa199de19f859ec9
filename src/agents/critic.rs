//! Critic agent: scores the current plan against both validator results.
//! Read-only; never mutates the plan.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::plan::{Critique, FloorPlanGraph, ValidatorResult};

pub struct CriticAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

pub struct CriticInput {
    pub plan: FloorPlanGraph,
    pub regulatory: ValidatorResult,
    pub cultural: ValidatorResult,
}

#[derive(Serialize)]
struct CriticContext<'a> {
    plan: &'a FloorPlanGraph,
    regulatory: &'a ValidatorResult,
    cultural: &'a ValidatorResult,
}

#[derive(Debug, Deserialize)]
struct CriticResponse {
    spatial_efficiency: f64,
    circulation_quality: f64,
    natural_lighting: f64,
    privacy_gradient: f64,
    aesthetic_balance: f64,
    overall_confidence: f64,
    #[serde(default)]
    critiques: Vec<String>,
    #[serde(default)]
    strengths: Vec<String>,
}

#[async_trait]
impl Agent<CriticInput, Critique> for CriticAgent {
    fn name(&self) -> &'static str {
        "critic"
    }

    async fn execute(&self, input: CriticInput) -> Result<AgentOutput<Critique>, AgentError> {
        let started = Instant::now();
        let router_config = self.router.config_for(AgentRole::Critic);
        let context = CriticContext { plan: &input.plan, regulatory: &input.regulatory, cultural: &input.cultural };
        let prompt = crate::llm::provider::embed_json_context(
            "Critique this candidate floor plan. Return JSON with six scores in [0,1] \
             (spatial_efficiency, circulation_quality, natural_lighting, privacy_gradient, \
             aesthetic_balance, overall_confidence) plus `critiques` and `strengths` string lists \
             (at most 5 entries each).",
            &context,
        );

        let result =
            generate_structured::<CriticResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt).await?;

        let critique = Critique {
            spatial_efficiency: result.data.spatial_efficiency,
            circulation_quality: result.data.circulation_quality,
            natural_lighting: result.data.natural_lighting,
            privacy_gradient: result.data.privacy_gradient,
            aesthetic_balance: result.data.aesthetic_balance,
            overall_confidence: result.data.overall_confidence,
            critiques: result.data.critiques,
            strengths: result.data.strengths,
        }
        .clamped();

        Ok(timed(self.name(), result.model_used, result.token_count, started, critique))
    }
}
