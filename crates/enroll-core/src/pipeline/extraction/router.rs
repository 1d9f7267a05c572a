use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use super::domain::JobId;
use super::ocr::TextRecognizer;
use super::repository::{DocumentStore, JobStore};
use super::service::{ExtractionJobManager, SubmitError};
use crate::pipeline::profile::{ProfileId, ProfileStore};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) profile_id: String,
    /// Base64-encoded document image.
    pub(crate) document: String,
}

/// Router builder exposing the submit and poll endpoints.
pub fn extraction_router<J, P, D, R>(manager: Arc<ExtractionJobManager<J, P, D, R>>) -> Router
where
    J: JobStore + 'static,
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
    R: TextRecognizer + 'static,
{
    Router::new()
        .route("/api/v1/extraction-jobs", post(submit_handler::<J, P, D, R>))
        .route(
            "/api/v1/extraction-jobs/:job_id",
            get(status_handler::<J, P, D, R>),
        )
        .with_state(manager)
}

pub(crate) async fn submit_handler<J, P, D, R>(
    State(manager): State<Arc<ExtractionJobManager<J, P, D, R>>>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    J: JobStore + 'static,
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
    R: TextRecognizer + 'static,
{
    let blob = match base64::engine::general_purpose::STANDARD.decode(&request.document) {
        Ok(blob) => blob,
        Err(_) => {
            let payload = json!({ "error": "document must be valid base64" });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match manager.submit(ProfileId(request.profile_id), blob) {
        Ok(job_id) => {
            let payload = json!({ "job_id": job_id.0 });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(SubmitError::UnknownProfile) => {
            let payload = json!({ "error": "profile not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(SubmitError::UnreadableDocument) => {
            let payload = json!({ "error": "document is not a readable image" });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<J, P, D, R>(
    State(manager): State<Arc<ExtractionJobManager<J, P, D, R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    J: JobStore + 'static,
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
    R: TextRecognizer + 'static,
{
    match manager.status(&JobId(job_id)) {
        Ok(Some(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "job not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
