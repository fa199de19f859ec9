//! Server configuration: file defaults, then environment-variable
//! overrides, then (in `main.rs`) CLI flags taking final priority.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::llm::{AgentRole, ModelRouterConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file '{path}': {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to parse config file '{path}': {source}")]
    Parse { path: String, #[source] source: serde_yaml::Error },
    #[error("environment variable '{name}' could not be parsed: {value}")]
    InvalidEnvValue { name: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmClientConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "FLOORPLAN_FORGE_LLM_API_KEY".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub llm: LlmClientConfig,
    #[serde(default)]
    pub router_overrides: Option<HashMap<AgentRole, ModelRouterConfig>>,
    pub convergence_threshold: f32,
    pub max_iterations: u32,
    pub job_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().expect("static bind address parses"),
            llm: LlmClientConfig::default(),
            router_overrides: None,
            convergence_threshold: 0.70,
            max_iterations: 3,
            job_ttl_secs: 1800,
            max_sessions: 1000,
        }
    }
}

const ENV_PREFIX: &str = "FLOORPLAN_FORGE_";

impl ServerConfig {
    /// Load from an optional YAML file (falling back to `Default` if absent
    /// or the path is `None`), then layer environment-variable overrides on
    /// top.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigLoadError::Io { path: path.display().to_string(), source })?;
        serde_yaml::from_str(&raw)
            .map_err(|source| ConfigLoadError::Parse { path: path.display().to_string(), source })
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigLoadError> {
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}BIND_ADDR")) {
            self.bind_addr = value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue { name: "BIND_ADDR".to_string(), value })?;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}LLM_BASE_URL")) {
            self.llm.base_url = value;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}LLM_API_KEY_ENV")) {
            self.llm.api_key_env = value;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}CONVERGENCE_THRESHOLD")) {
            self.convergence_threshold = value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue { name: "CONVERGENCE_THRESHOLD".to_string(), value })?;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}MAX_ITERATIONS")) {
            self.max_iterations = value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue { name: "MAX_ITERATIONS".to_string(), value })?;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}JOB_TTL_SECS")) {
            self.job_ttl_secs = value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue { name: "JOB_TTL_SECS".to_string(), value })?;
        }
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}MAX_SESSIONS")) {
            self.max_sessions = value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue { name: "MAX_SESSIONS".to_string(), value })?;
        }
        Ok(())
    }
}
