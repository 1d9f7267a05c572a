use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use enroll_core::pipeline::extraction::{
    extraction_router, ExtractionJobManager, TextRecognizer,
};
use enroll_core::pipeline::ranking::{ranking_router, AttemptLimiter, RankingEngine};

use crate::infra::{
    AppState, InMemoryApplicationDirectory, InMemoryDocumentStore, InMemoryJobStore,
    InMemoryProfileStore,
};

pub(crate) type PipelineManager<R> =
    ExtractionJobManager<InMemoryJobStore, InMemoryProfileStore, InMemoryDocumentStore, R>;

pub(crate) fn with_pipeline_routes<R>(
    manager: Arc<PipelineManager<R>>,
    engine: Arc<RankingEngine<InMemoryApplicationDirectory, InMemoryProfileStore>>,
    limiter: Arc<AttemptLimiter<InMemoryApplicationDirectory>>,
    profiles: Arc<InMemoryProfileStore>,
) -> axum::Router
where
    R: TextRecognizer + 'static,
{
    extraction_router(manager)
        .merge(ranking_router(engine, limiter))
        .merge(
            axum::Router::new()
                .route("/api/v1/profiles", axum::routing::post(create_profile))
                .with_state(profiles),
        )
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Registration stub standing in for the external identity system, so a
/// standalone deployment can mint profiles to submit documents against.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateProfileRequest {
    #[serde(default)]
    pub(crate) id: Option<String>,
}

pub(crate) async fn create_profile(
    State(profiles): State<Arc<InMemoryProfileStore>>,
    Json(request): Json<CreateProfileRequest>,
) -> impl IntoResponse {
    match profiles.create(request.id) {
        Some(id) => (
            StatusCode::CREATED,
            Json(json!({ "profile_id": id.0 })),
        ),
        None => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "profile id already registered" })),
        ),
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
