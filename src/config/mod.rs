pub mod settings;

pub use settings::{LlmClientConfig, ServerConfig};
