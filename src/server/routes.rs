//! Route handlers: job submission, SSE progress stream, status polling,
//! health check, and `501`-stub out-of-core endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::models::config::ProjectConfig;
use crate::orchestrator::CancelFlag;
use crate::server::ServerContext;

pub fn router(ctx: ServerContext) -> Router {
    Router::new()
        .route("/api/generate", post(submit_generate))
        .route("/api/generate/:job_id/stream", get(stream_generate))
        .route("/api/generate/:job_id/status", get(generate_status))
        .route("/api/health", get(health))
        .route("/api/analyze-image", post(analyze_image_stub))
        .route("/api/modify/analyze", post(modify_analyze_stub))
        .route("/api/modify/apply", post(modify_apply_stub))
        .route("/api/estimate", post(estimate_stub))
        .route("/api/furniture", post(furniture_stub))
        .route("/api/generate-alternatives", post(generate_alternatives_stub))
        .with_state(ctx)
}

#[derive(Serialize)]
struct SubmitResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn submit_generate(
    State(ctx): State<ServerContext>,
    Json(config): Json<ProjectConfig>,
) -> impl IntoResponse {
    if let Err(err) = config.validate() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: err.to_string() }),
        )
            .into_response();
    }

    let job_id = Uuid::new_v4().to_string();
    ctx.job_store.create(job_id.clone(), "anonymous".to_string()).await;

    let cancel = CancelFlag::new();
    ctx.cancel_flags.write().await.insert(job_id.clone(), cancel.clone());

    let deps = ctx.orchestrator_deps();
    let run_job_id = job_id.clone();
    tokio::spawn(async move {
        crate::orchestrator::run(deps, run_job_id, config, cancel).await;
    });

    (axum::http::StatusCode::ACCEPTED, Json(SubmitResponse { job_id })).into_response()
}

async fn stream_generate(
    State(ctx): State<ServerContext>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (prefix, receiver) = ctx.progress_hub.subscribe(&job_id).await;

    let live = BroadcastStream::new(receiver).filter_map(|item| {
        futures::future::ready(match item {
            Ok(event) => Some(event),
            Err(_lagged) => None,
        })
    });
    let events = futures::stream::iter(prefix).chain(live);

    // Stop right after yielding a terminal event rather than relying on the
    // client to disconnect: a reconnect must see exactly one terminal event
    // and then a closed stream, never a second one from a later subscriber.
    let stream = events
        .scan(false, |done, event| {
            if *done {
                return futures::future::ready(None);
            }
            if event.is_terminal() {
                *done = true;
            }
            futures::future::ready(Some(event))
        })
        .map(|event| Ok(Event::default().data(event.to_sse_data())));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn generate_status(State(ctx): State<ServerContext>, Path(job_id): Path<String>) -> impl IntoResponse {
    match ctx.job_store.get(&job_id).await {
        Some(job) => Json(job).into_response(),
        None => (
            axum::http::StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: format!("job '{job_id}' not found") }),
        )
            .into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now().to_rfc3339() }))
}

fn out_of_core(collaborator: &'static str) -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_IMPLEMENTED,
        Json(json!({ "error": "not implemented in this service", "collaborator": collaborator })),
    )
}

async fn analyze_image_stub() -> impl IntoResponse {
    out_of_core("an image-analysis collaborator")
}

async fn modify_analyze_stub() -> impl IntoResponse {
    out_of_core("a plan-modification collaborator")
}

async fn modify_apply_stub() -> impl IntoResponse {
    out_of_core("a plan-modification collaborator")
}

async fn estimate_stub() -> impl IntoResponse {
    out_of_core("a cost-estimation collaborator")
}

async fn furniture_stub() -> impl IntoResponse {
    out_of_core("a furniture-layout collaborator")
}

async fn generate_alternatives_stub() -> impl IntoResponse {
    out_of_core("an alternatives-generation collaborator")
}
