//! Input agent: deterministic room-requirement skeleton plus a single
//! optional LLM call to parse free-text adjacency hints.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agents::{timed, Agent, AgentError, AgentOutput};
use crate::llm::{generate_structured, AgentRole, LlmProvider, ModelRouter};
use crate::models::config::{AdjacencyPreference, NormalizedSpec, ProjectConfig, RoomRequirement};
use crate::models::room::Classification;
use crate::validators::municipal;

pub struct InputAgent {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
}

#[derive(Debug, Deserialize)]
struct AdjacencyResponse {
    #[serde(default)]
    adjacencies: Vec<AdjacencyPreference>,
}

fn has_requirement(requirements: &[String], needle: &str) -> bool {
    requirements.iter().any(|r| r.to_lowercase().contains(needle))
}

fn count_requirement(requirements: &[String], needle: &str) -> usize {
    requirements.iter().filter(|r| r.to_lowercase().contains(needle)).count()
}

/// Deterministic rule-based room-requirement builder. No LLM involvement:
/// always a master bedroom; one additional bedroom per requirement string
/// beyond the first that mentions "bedroom"; always kitchen/living/entrance;
/// bathrooms per config; optional dining/pooja/study/balcony/storage if
/// requested; staircase if multi-storey; parking sized by tag.
pub fn build_room_requirements(config: &ProjectConfig) -> Vec<RoomRequirement> {
    let mut requirements = Vec::new();

    requirements.push(RoomRequirement {
        classification: Classification::MasterBedroom,
        display_name: "Master Bedroom".to_string(),
        minimum_area: 11.0,
        count: 1,
    });

    let bedroom_mentions = count_requirement(&config.requirements, "bedroom");
    let extra_bedrooms = bedroom_mentions.saturating_sub(1);
    if extra_bedrooms > 0 {
        requirements.push(RoomRequirement {
            classification: Classification::Bedroom,
            display_name: "Bedroom".to_string(),
            minimum_area: 9.0,
            count: extra_bedrooms as u32,
        });
    }

    requirements.push(RoomRequirement {
        classification: Classification::Kitchen,
        display_name: "Kitchen".to_string(),
        minimum_area: 6.0,
        count: 1,
    });
    requirements.push(RoomRequirement {
        classification: Classification::LivingRoom,
        display_name: "Living Room".to_string(),
        minimum_area: 12.0,
        count: 1,
    });
    requirements.push(RoomRequirement {
        classification: Classification::Entrance,
        display_name: "Entrance / Foyer".to_string(),
        minimum_area: 3.0,
        count: 1,
    });

    let bathrooms = config.bathrooms.unwrap_or(1).max(1);
    requirements.push(RoomRequirement {
        classification: Classification::Bathroom,
        display_name: "Bathroom".to_string(),
        minimum_area: 3.0,
        count: bathrooms,
    });

    if has_requirement(&config.requirements, "dining") {
        requirements.push(RoomRequirement {
            classification: Classification::DiningRoom,
            display_name: "Dining Room".to_string(),
            minimum_area: 8.0,
            count: 1,
        });
    }
    if has_requirement(&config.requirements, "pooja")
        || has_requirement(&config.requirements, "puja")
        || has_requirement(&config.requirements, "prayer")
    {
        requirements.push(RoomRequirement {
            classification: Classification::PoojaRoom,
            display_name: "Pooja Room".to_string(),
            minimum_area: 2.5,
            count: 1,
        });
    }
    if has_requirement(&config.requirements, "study") || has_requirement(&config.requirements, "office") {
        requirements.push(RoomRequirement {
            classification: Classification::Study,
            display_name: "Study".to_string(),
            minimum_area: 6.0,
            count: 1,
        });
    }
    if has_requirement(&config.requirements, "balcony") {
        requirements.push(RoomRequirement {
            classification: Classification::Balcony,
            display_name: "Balcony".to_string(),
            minimum_area: 3.0,
            count: 1,
        });
    }
    if has_requirement(&config.requirements, "storage") || has_requirement(&config.requirements, "store") {
        requirements.push(RoomRequirement {
            classification: Classification::Storage,
            display_name: "Storage".to_string(),
            minimum_area: 2.0,
            count: 1,
        });
    }

    if config.floors() > 1 {
        requirements.push(RoomRequirement {
            classification: Classification::Staircase,
            display_name: "Staircase".to_string(),
            minimum_area: 4.0,
            count: 1,
        });
    }

    let parking_area = match config.parking {
        Some(crate::models::config::ParkingTag::Double) => 30.0,
        Some(crate::models::config::ParkingTag::Single) => 15.0,
        Some(crate::models::config::ParkingTag::None) | None => 0.0,
    };
    if parking_area > 0.0 {
        requirements.push(RoomRequirement {
            classification: Classification::Parking,
            display_name: "Parking".to_string(),
            minimum_area: parking_area,
            count: 1,
        });
    }

    requirements
}

#[async_trait]
impl Agent<ProjectConfig, NormalizedSpec> for InputAgent {
    fn name(&self) -> &'static str {
        "input"
    }

    async fn execute(&self, config: ProjectConfig) -> Result<AgentOutput<NormalizedSpec>, AgentError> {
        let started = Instant::now();
        let profile = municipal::lookup(&config.municipal_authority);
        let room_requirements = build_room_requirements(&config);
        let router_config = self.router.config_for(AgentRole::Input);

        // Adjacency parsing is optional: failure never aborts the run, it
        // just yields an empty adjacency list.
        let free_text: Vec<&str> =
            config.requirements.iter().map(|s| s.as_str()).filter(|s| s.contains("near") || s.contains("next to") || s.contains("away from")).collect();

        let (adjacency_preferences, model_used, token_count) = if free_text.is_empty() {
            (Vec::new(), "none".to_string(), None)
        } else {
            let prompt = format!(
                "Parse the following free-text room placement hints into a JSON object \
                 `{{\"adjacencies\": [{{\"room_a\": str, \"room_b\": str, \"relation\": \"adjacent\"|\"nearby\"|\"separated\"}}]}}`.\n\
                 Hints:\n{}",
                free_text.join("\n")
            );
            match generate_structured::<AdjacencyResponse>(self.llm.as_ref(), &self.router, &router_config, &prompt).await {
                Ok(result) => (result.data.adjacencies, result.model_used, result.token_count),
                Err(err) => {
                    warn!(error = %err, "adjacency parse failed, continuing with an empty adjacency list");
                    (Vec::new(), router_config.model_id.clone(), None)
                }
            }
        };

        let spec = NormalizedSpec {
            plot_width: config.width,
            plot_depth: config.depth,
            room_requirements,
            municipal_profile: profile,
            strictness_coefficient: config.strictness_coefficient(),
            adjacency_preferences,
            floors: config.floors(),
        };

        Ok(timed(self.name(), model_used, token_count, started, spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ProjectConfig;

    fn base_config(requirements: Vec<&str>) -> ProjectConfig {
        ProjectConfig {
            width: 12.0,
            depth: 18.0,
            requirements: requirements.into_iter().map(String::from).collect(),
            municipal_authority: "national".to_string(),
            cultural_system: "vastu".to_string(),
            strictness: None,
            floors: None,
            bathrooms: None,
            parking: None,
        }
    }

    #[test]
    fn always_includes_master_bedroom_kitchen_living_entrance() {
        let config = base_config(vec!["Master Bedroom", "Kitchen", "Living Room"]);
        let reqs = build_room_requirements(&config);
        assert!(reqs.iter().any(|r| r.classification == Classification::MasterBedroom));
        assert!(reqs.iter().any(|r| r.classification == Classification::Kitchen));
        assert!(reqs.iter().any(|r| r.classification == Classification::LivingRoom));
        assert!(reqs.iter().any(|r| r.classification == Classification::Entrance));
    }

    #[test]
    fn extra_bedroom_mentions_add_additional_bedroom_requirement() {
        let config = base_config(vec!["Master Bedroom", "Bedroom", "Bedroom", "Kitchen"]);
        let reqs = build_room_requirements(&config);
        let extra = reqs.iter().find(|r| r.classification == Classification::Bedroom).unwrap();
        assert_eq!(extra.count, 2);
    }

    #[test]
    fn staircase_only_appears_for_multi_storey() {
        let mut config = base_config(vec!["Master Bedroom"]);
        assert!(!build_room_requirements(&config).iter().any(|r| r.classification == Classification::Staircase));
        config.floors = Some(2);
        assert!(build_room_requirements(&config).iter().any(|r| r.classification == Classification::Staircase));
    }

    #[test]
    fn parking_sized_by_tag() {
        use crate::models::config::ParkingTag;
        let mut config = base_config(vec!["Master Bedroom"]);
        config.parking = Some(ParkingTag::Double);
        let reqs = build_room_requirements(&config);
        let parking = reqs.iter().find(|r| r.classification == Classification::Parking).unwrap();
        assert_eq!(parking.minimum_area, 30.0);
    }
}
