//! Spatial agent: produces the initial candidate floor plan from a
//! `NormalizedSpec`. Never trusts LLM-reported area totals; always
//! recomputes them server-side from the returned room rectangles.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::config::NormalizedSpec;
use crate::models::plan::FloorPlanGraph;
use crate::models::room::{Room, RoomType};

const BOUNDS_TOLERANCE_M: f64 = 1e-6;
const OVERLAP_EPSILON_M2: f64 = 0.01;

/// Room types subject to the mutual non-overlap invariant.
const NON_OVERLAPPING: &[RoomType] = &[RoomType::Room, RoomType::Circulation, RoomType::Service];

fn overlap_area(a: &crate::models::room::Rect, b: &crate::models::room::Rect) -> f64 {
    let x_overlap = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
    let y_overlap = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
    if x_overlap > 0.0 && y_overlap > 0.0 {
        x_overlap * y_overlap
    } else {
        0.0
    }
}

/// Reject a candidate room layout that violates any of the invariants an
/// LLM-returned plan is never trusted to satisfy on its own: rectangles
/// inside the plot bounds, positive dimensions, wall features that fit on
/// their wall, and no more-than-incidental overlap between rooms the plan
/// treats as distinct usable space.
fn validate_room_invariants(rooms: &[Room], plot_w: f64, plot_d: f64) -> Result<(), AgentError> {
    for room in rooms {
        let rect = &room.rect;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(AgentError::PostProcessing(format!(
                "room '{}' has non-positive dimensions ({} x {})",
                room.id, rect.width, rect.height
            )));
        }
        if rect.x < -BOUNDS_TOLERANCE_M
            || rect.y < -BOUNDS_TOLERANCE_M
            || rect.x + rect.width > plot_w + BOUNDS_TOLERANCE_M
            || rect.y + rect.height > plot_d + BOUNDS_TOLERANCE_M
        {
            return Err(AgentError::PostProcessing(format!(
                "room '{}' rectangle lies outside the {}x{} plot bounds",
                room.id, plot_w, plot_d
            )));
        }
        for feature in &room.features {
            let wall_length = rect.wall_length(feature.wall);
            if feature.position + feature.width > wall_length + BOUNDS_TOLERANCE_M {
                return Err(AgentError::PostProcessing(format!(
                    "room '{}' has a wall feature extending past its {:?} wall",
                    room.id, feature.wall
                )));
            }
        }
    }

    for (i, a) in rooms.iter().enumerate() {
        if !NON_OVERLAPPING.contains(&a.room_type) {
            continue;
        }
        for b in &rooms[i + 1..] {
            if !NON_OVERLAPPING.contains(&b.room_type) {
                continue;
            }
            if overlap_area(&a.rect, &b.rect) > OVERLAP_EPSILON_M2 {
                return Err(AgentError::PostProcessing(format!(
                    "rooms '{}' and '{}' overlap by more than the allowed epsilon",
                    a.id, b.id
                )));
            }
        }
    }

    Ok(())
}

pub struct SpatialAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

#[derive(Debug, Deserialize)]
struct SpatialResponse {
    rooms: Vec<Room>,
    #[serde(default)]
    design_log: Vec<String>,
    // LLM-reported totals are accepted on the wire but discarded below;
    // field kept only so a strict-extra-fields schema wouldn't reject it.
    #[allow(dead_code)]
    #[serde(default)]
    total_area: Option<f64>,
}

fn build_prompt(spec: &NormalizedSpec) -> String {
    crate::llm::provider::embed_json_context(
        "Generate a residential floor plan as JSON `{\"rooms\": [Room...], \"design_log\": [string...]}` \
         covering every room requirement, with rectangles inside the plot bounds.",
        spec,
    )
}

/// Recompute area totals from enriched rooms rather than trusting whatever
/// the LLM reported. Shared with the refinement agent, which performs the
/// same recomputation after every pass.
pub fn assemble_plan(
    rooms: Vec<Room>,
    design_log: Vec<String>,
    plot_w: f64,
    plot_d: f64,
    adjacencies: Vec<crate::models::config::AdjacencyPreference>,
) -> Result<FloorPlanGraph, AgentError> {
    validate_room_invariants(&rooms, plot_w, plot_d)?;

    let enriched = crate::geometry::enrich(&rooms, plot_w, plot_d);
    let built_up_area: f64 = enriched
        .iter()
        .filter(|r| matches!(r.room.room_type, RoomType::Room | RoomType::Service))
        .map(|r| r.area)
        .sum();
    let circulation_area: f64 =
        enriched.iter().filter(|r| matches!(r.room.room_type, RoomType::Circulation)).map(|r| r.area).sum();
    let setback_area: f64 =
        enriched.iter().filter(|r| matches!(r.room.room_type, RoomType::Setback)).map(|r| r.area).sum();
    let outdoor_area: f64 =
        enriched.iter().filter(|r| matches!(r.room.room_type, RoomType::Outdoor)).map(|r| r.area).sum();
    let total_area = plot_w * plot_d;
    let plot_coverage_ratio = if total_area > 0.0 { built_up_area / total_area } else { 0.0 };

    Ok(FloorPlanGraph {
        rooms: enriched,
        total_area,
        built_up_area,
        circulation_area,
        setback_area,
        outdoor_area,
        plot_coverage_ratio,
        design_log,
        adjacencies,
    })
}

#[async_trait]
impl Agent<NormalizedSpec, FloorPlanGraph> for SpatialAgent {
    fn name(&self) -> &'static str {
        "spatial"
    }

    async fn execute(&self, spec: NormalizedSpec) -> Result<AgentOutput<FloorPlanGraph>, AgentError> {
        let started = Instant::now();
        let router_config = self.router.config_for(AgentRole::Spatial);
        let prompt = build_prompt(&spec);

        let result =
            generate_structured::<SpatialResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt).await?;

        let plan = assemble_plan(
            result.data.rooms,
            result.data.design_log,
            spec.plot_width,
            spec.plot_depth,
            spec.adjacency_preferences,
        )?;

        Ok(timed(self.name(), result.model_used, result.token_count, started, plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::{Rect, RoomType};

    #[test]
    fn assemble_plan_recomputes_totals_from_rooms_not_llm_claims() {
        let rooms = vec![Room {
            id: "r1".into(),
            name: "Kitchen".into(),
            room_type: RoomType::Room,
            rect: Rect { x: 1.0, y: 1.0, width: 3.0, height: 2.0 },
            features: vec![],
            guidance: String::new(),
            floor: None,
        }];
        let plan = assemble_plan(rooms, vec!["placed kitchen".to_string()], 12.0, 18.0, vec![]).unwrap();
        assert_eq!(plan.built_up_area, 6.0);
        assert_eq!(plan.total_area, 216.0);
        assert!((plan.plot_coverage_ratio - 6.0 / 216.0).abs() < 1e-9);
    }

    fn room(id: &str, room_type: RoomType, rect: Rect) -> Room {
        Room { id: id.into(), name: id.into(), room_type, rect, features: vec![], guidance: String::new(), floor: None }
    }

    #[test]
    fn assemble_plan_rejects_room_outside_plot_bounds() {
        let rooms = vec![room("r1", RoomType::Room, Rect { x: 10.0, y: 0.0, width: 5.0, height: 5.0 })];
        let err = assemble_plan(rooms, vec![], 12.0, 18.0, vec![]).unwrap_err();
        assert!(matches!(err, AgentError::PostProcessing(_)));
    }

    #[test]
    fn assemble_plan_rejects_non_positive_dimensions() {
        let rooms = vec![room("r1", RoomType::Room, Rect { x: 0.0, y: 0.0, width: 0.0, height: 5.0 })];
        let err = assemble_plan(rooms, vec![], 12.0, 18.0, vec![]).unwrap_err();
        assert!(matches!(err, AgentError::PostProcessing(_)));
    }

    #[test]
    fn assemble_plan_rejects_overlapping_rooms() {
        let rooms = vec![
            room("r1", RoomType::Room, Rect { x: 0.0, y: 0.0, width: 5.0, height: 5.0 }),
            room("r2", RoomType::Room, Rect { x: 3.0, y: 3.0, width: 5.0, height: 5.0 }),
        ];
        let err = assemble_plan(rooms, vec![], 12.0, 18.0, vec![]).unwrap_err();
        assert!(matches!(err, AgentError::PostProcessing(_)));
    }

    #[test]
    fn assemble_plan_allows_rooms_touching_only_at_a_shared_edge() {
        let rooms = vec![
            room("r1", RoomType::Room, Rect { x: 0.0, y: 0.0, width: 5.0, height: 5.0 }),
            room("r2", RoomType::Circulation, Rect { x: 5.0, y: 0.0, width: 5.0, height: 5.0 }),
        ];
        assert!(assemble_plan(rooms, vec![], 12.0, 18.0, vec![]).is_ok());
    }
}
