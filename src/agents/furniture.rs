//! Furniture agent: takes the final rooms and returns per-room furniture
//! placements. Optional and best-effort — failure is logged and tolerated
//! by the orchestrator, and the final plan simply omits furniture.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::plan::FurnitureItem;
use crate::models::room::EnrichedRoom;

pub struct FurnitureAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

#[derive(Serialize)]
struct FurnitureContext<'a> {
    rooms: &'a [EnrichedRoom],
}

#[derive(Debug, Deserialize, Default)]
struct FurnitureResponse {
    #[serde(default)]
    furniture: Vec<FurnitureItem>,
}

#[async_trait]
impl Agent<Vec<EnrichedRoom>, Vec<FurnitureItem>> for FurnitureAgent {
    fn name(&self) -> &'static str {
        "furniture"
    }

    async fn execute(&self, rooms: Vec<EnrichedRoom>) -> Result<AgentOutput<Vec<FurnitureItem>>, AgentError> {
        let started = Instant::now();
        let router_config = self.router.config_for(AgentRole::Furniture);
        let context = FurnitureContext { rooms: &rooms };
        let prompt = crate::llm::provider::embed_json_context(
            "Place furniture in each room with absolute coordinates, honoring clearance around \
             doors. Return JSON `{\"furniture\": [{\"room_id\", \"name\", \"x\", \"y\", \"width\", \
             \"depth\", \"rotation_degrees\"}...]}`.",
            &context,
        );

        let result =
            generate_structured::<FurnitureResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt)
                .await?;

        Ok(timed(self.name(), result.model_used, result.token_count, started, result.data.furniture))
    }
}
