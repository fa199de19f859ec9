//! Refinement agent: takes the current plan, spec, violations, and critique
//! and returns an updated room layout plus a human-readable changelog. The
//! post-processing step mirrors the spatial agent's: re-enrich, recompute
//! totals, never trust the LLM's own totals.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::spatial::assemble_plan;
use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::config::NormalizedSpec;
use crate::models::plan::{Critique, FloorPlanGraph, ValidatorResult};
use crate::models::room::Room;

pub struct RefinementAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

pub struct RefinementInput {
    pub plan: FloorPlanGraph,
    pub spec: NormalizedSpec,
    pub regulatory: ValidatorResult,
    pub cultural: ValidatorResult,
    pub critique: Critique,
}

#[derive(Serialize)]
struct RefinementContext<'a> {
    plan: &'a FloorPlanGraph,
    spec: &'a NormalizedSpec,
    regulatory: &'a ValidatorResult,
    cultural: &'a ValidatorResult,
    critique: &'a Critique,
}

#[derive(Debug, Deserialize)]
struct RefinementResponse {
    rooms: Vec<Room>,
    #[serde(default)]
    changes_applied: Vec<String>,
}

#[async_trait]
impl Agent<RefinementInput, FloorPlanGraph> for RefinementAgent {
    fn name(&self) -> &'static str {
        "refinement"
    }

    async fn execute(&self, input: RefinementInput) -> Result<AgentOutput<FloorPlanGraph>, AgentError> {
        let started = Instant::now();
        let router_config = self.router.config_for(AgentRole::Refinement);
        let context = RefinementContext {
            plan: &input.plan,
            spec: &input.spec,
            regulatory: &input.regulatory,
            cultural: &input.cultural,
            critique: &input.critique,
        };
        let prompt = crate::llm::provider::embed_json_context(
            "Refine this floor plan to address the violations and critique below. Return JSON \
             `{\"rooms\": [Room...], \"changes_applied\": [string...]}` describing every change made \
             in plain language.",
            &context,
        );

        let result =
            generate_structured::<RefinementResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt)
                .await?;

        let mut design_log = input.plan.design_log.clone();
        design_log.push("--- Refinement Pass ---".to_string());
        design_log.extend(result.data.changes_applied);

        let plan = assemble_plan(
            result.data.rooms,
            design_log,
            input.spec.plot_width,
            input.spec.plot_depth,
            input.plan.adjacencies,
        )?;

        Ok(timed(self.name(), result.model_used, result.token_count, started, plan))
    }
}
