pub mod json_utils;
pub mod provider;
pub mod router;

pub use provider::{generate_structured, GeneratedStructured, HttpLlmProvider, LlmError, LlmProvider};
pub use router::{AgentRole, ModelRouter, ModelRouterConfig};
