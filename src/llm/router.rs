//! Model router: a closed map from agent role to model configuration, plus
//! the static per-model fallback chain consulted by the call layer on
//! provider failure. Each role has a fixed default that callers can
//! override wholesale, never merge field-by-field.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Input,
    Spatial,
    Critic,
    Refinement,
    Cost,
    Furniture,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Input => "input",
            AgentRole::Spatial => "spatial",
            AgentRole::Critic => "critic",
            AgentRole::Refinement => "refinement",
            AgentRole::Cost => "cost",
            AgentRole::Furniture => "furniture",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRouterConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

fn default_table() -> HashMap<AgentRole, ModelRouterConfig> {
    use AgentRole::*;
    let mut m = HashMap::new();
    m.insert(
        Input,
        ModelRouterConfig { model_id: "fast-flash".to_string(), temperature: 0.2, max_output_tokens: 512 },
    );
    m.insert(
        Spatial,
        ModelRouterConfig { model_id: "heavy-pro".to_string(), temperature: 0.7, max_output_tokens: 4096 },
    );
    m.insert(
        Critic,
        ModelRouterConfig { model_id: "heavy-pro".to_string(), temperature: 0.3, max_output_tokens: 1024 },
    );
    m.insert(
        Refinement,
        ModelRouterConfig { model_id: "heavy-pro".to_string(), temperature: 0.5, max_output_tokens: 4096 },
    );
    m.insert(
        Cost,
        ModelRouterConfig { model_id: "fast-flash".to_string(), temperature: 0.2, max_output_tokens: 1024 },
    );
    m.insert(
        Furniture,
        ModelRouterConfig { model_id: "fast-flash".to_string(), temperature: 0.4, max_output_tokens: 1024 },
    );
    m
}

/// Fallback chain keyed by primary model id, tried in order on provider
/// failure. First success wins; if all exhaust, the original error is
/// surfaced.
fn fallback_table() -> HashMap<&'static str, Vec<&'static str>> {
    let mut m = HashMap::new();
    m.insert("heavy-pro", vec!["heavy-pro-preview", "fast-flash"]);
    m.insert("fast-flash", vec!["fast-flash-lite"]);
    m
}

static TABLE: Lazy<HashMap<AgentRole, ModelRouterConfig>> = Lazy::new(default_table);
static FALLBACKS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(fallback_table);

/// Per-role router with optional overrides layered on top of the static
/// defaults: an explicit override wins, otherwise the closed default table.
#[derive(Debug, Clone, Default)]
pub struct ModelRouter {
    overrides: HashMap<AgentRole, ModelRouterConfig>,
}

impl ModelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<AgentRole, ModelRouterConfig>) -> Self {
        Self { overrides }
    }

    pub fn config_for(&self, role: AgentRole) -> ModelRouterConfig {
        self.overrides
            .get(&role)
            .cloned()
            .unwrap_or_else(|| TABLE.get(&role).expect("router table covers every role").clone())
    }

    pub fn fallback_chain(&self, model_id: &str) -> Vec<String> {
        FALLBACKS.get(model_id).cloned().unwrap_or_default().into_iter().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_roles_get_heavy_model_and_looser_temperature() {
        let router = ModelRouter::new();
        let spatial = router.config_for(AgentRole::Spatial);
        let input = router.config_for(AgentRole::Input);
        assert_eq!(spatial.model_id, "heavy-pro");
        assert!(spatial.temperature > input.temperature);
        assert!(spatial.max_output_tokens > input.max_output_tokens);
    }

    #[test]
    fn every_role_has_a_default_entry() {
        let router = ModelRouter::new();
        for role in [
            AgentRole::Input,
            AgentRole::Spatial,
            AgentRole::Critic,
            AgentRole::Refinement,
            AgentRole::Cost,
            AgentRole::Furniture,
        ] {
            let _ = router.config_for(role);
        }
    }

    #[test]
    fn override_takes_priority_over_default() {
        let mut overrides = HashMap::new();
        overrides.insert(
            AgentRole::Input,
            ModelRouterConfig { model_id: "custom".to_string(), temperature: 0.9, max_output_tokens: 1 },
        );
        let router = ModelRouter::with_overrides(overrides);
        assert_eq!(router.config_for(AgentRole::Input).model_id, "custom");
    }

    #[test]
    fn fallback_chain_is_non_empty_for_known_models() {
        let router = ModelRouter::new();
        assert!(!router.fallback_chain("heavy-pro").is_empty());
    }
}
