//! HTTP transport: a single `ServerContext` threaded as `axum` state into
//! every route, plus the router assembly itself.

pub mod routes;

use std::sync::Arc;

use axum::Router;

use crate::config::ServerConfig;
use crate::jobstore::JobStore;
use crate::llm::{HttpLlmProvider, LlmProvider, ModelRouter};
use crate::orchestrator::CancelFlag;
use crate::progress_hub::ProgressHub;

/// Everything a route handler or the orchestrator needs, constructed once in
/// `main.rs`. No global singletons anywhere in this crate.
#[derive(Clone)]
pub struct ServerContext {
    pub job_store: Arc<JobStore>,
    pub progress_hub: Arc<ProgressHub>,
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
    pub config: Arc<ServerConfig>,
    pub cancel_flags: Arc<tokio::sync::RwLock<std::collections::HashMap<String, CancelFlag>>>,
}

impl ServerContext {
    pub fn new(config: ServerConfig, api_key: String) -> Self {
        let llm: Arc<dyn LlmProvider> = Arc::new(HttpLlmProvider::new(
            config.llm.base_url.clone(),
            api_key,
            std::time::Duration::from_secs(config.llm.request_timeout_secs),
        ));
        let router = Arc::new(
            config
                .router_overrides
                .clone()
                .map(ModelRouter::with_overrides)
                .unwrap_or_default(),
        );
        let job_store = Arc::new(JobStore::new(config.job_ttl_secs as i64, config.max_sessions));
        let progress_hub = Arc::new(ProgressHub::new());

        Self {
            job_store,
            progress_hub,
            llm,
            router,
            config: Arc::new(config),
            cancel_flags: Arc::new(tokio::sync::RwLock::new(std::collections::HashMap::new())),
        }
    }

    pub fn orchestrator_deps(&self) -> Arc<crate::orchestrator::OrchestratorDeps> {
        Arc::new(crate::orchestrator::OrchestratorDeps {
            llm: self.llm.clone(),
            router: self.router.clone(),
            job_store: self.job_store.clone(),
            progress_hub: self.progress_hub.clone(),
            max_iterations: self.config.max_iterations,
            convergence_threshold: self.config.convergence_threshold as f64,
        })
    }
}

pub fn build_router(ctx: ServerContext) -> Router {
    routes::router(ctx)
}
