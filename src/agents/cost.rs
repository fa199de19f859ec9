//! Cost agent: takes the final plan and spec, returns a bill of materials
//! and a cost range. Non-blocking for convergence: the orchestrator treats
//! failure here as recoverable (empty BOM, zero cost range, soft-error
//! compliance item), never as a run failure.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::config::NormalizedSpec;
use crate::models::plan::{BomLine, CostRange, FloorPlanGraph};

pub struct CostAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

pub struct CostInput {
    pub plan: FloorPlanGraph,
    pub spec: NormalizedSpec,
}

#[derive(Serialize)]
struct CostContext<'a> {
    plan: &'a FloorPlanGraph,
    spec: &'a NormalizedSpec,
}

#[derive(Debug, Deserialize, Default)]
struct CostResponse {
    #[serde(default)]
    bom: Vec<BomLine>,
    #[serde(default)]
    cost_range: Option<CostRange>,
}

pub struct CostOutput {
    pub bom: Vec<BomLine>,
    pub cost_range: CostRange,
}

#[async_trait]
impl Agent<CostInput, CostOutput> for CostAgent {
    fn name(&self) -> &'static str {
        "cost"
    }

    async fn execute(&self, input: CostInput) -> Result<AgentOutput<CostOutput>, AgentError> {
        let started = Instant::now();
        let router_config = self.router.config_for(AgentRole::Cost);
        let context = CostContext { plan: &input.plan, spec: &input.spec };
        let prompt = crate::llm::provider::embed_json_context(
            "Estimate a bill of materials and total cost range for this floor plan. Return JSON \
             `{\"bom\": [{\"material\", \"quantity\", \"unit\", \"estimated_cost\"}...], \
             \"cost_range\": {\"min\", \"max\", \"currency\"}}`.",
            &context,
        );

        let result =
            generate_structured::<CostResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt).await?;

        let output = CostOutput {
            bom: result.data.bom,
            cost_range: result.data.cost_range.unwrap_or_default(),
        };

        Ok(timed(self.name(), result.model_used, result.token_count, started, output))
    }
}
