use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use base64::Engine as _;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::pipeline::extraction::router::extraction_router;

fn encode(blob: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(blob)
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

fn submit_request(profile_id: &str, document: String) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/api/v1/extraction-jobs")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&json!({
                "profile_id": profile_id,
                "document": document,
            }))
            .expect("payload serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_accepts_valid_payloads() {
    let (manager, profiles) = build_manager(Arc::new(ScriptedRecognizer::new("")));
    profiles.register("applicant-1");
    let router = extraction_router(Arc::new(manager));

    let response = router
        .oneshot(submit_request("applicant-1", encode(&png_page(32))))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert!(payload["job_id"].as_str().is_some());
}

#[tokio::test]
async fn submit_route_rejects_invalid_base64() {
    let (manager, profiles) = build_manager(Arc::new(ScriptedRecognizer::new("")));
    profiles.register("applicant-1");
    let router = extraction_router(Arc::new(manager));

    let response = router
        .oneshot(submit_request("applicant-1", "%%% not base64 %%%".to_string()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_route_reports_unknown_profiles() {
    let (manager, _profiles) = build_manager(Arc::new(ScriptedRecognizer::new("")));
    let router = extraction_router(Arc::new(manager));

    let response = router
        .oneshot(submit_request("nobody", encode(&png_page(32))))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_route_rejects_undecodable_documents() {
    let (manager, profiles) = build_manager(Arc::new(ScriptedRecognizer::new("")));
    profiles.register("applicant-1");
    let router = extraction_router(Arc::new(manager));

    let response = router
        .oneshot(submit_request("applicant-1", encode(b"not an image")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_route_reports_unknown_jobs() {
    let (manager, _profiles) = build_manager(Arc::new(ScriptedRecognizer::new("")));
    let router = extraction_router(Arc::new(manager));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/extraction-jobs/job-999999")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_route_eventually_reports_success() {
    let (manager, profiles) =
        build_manager(Arc::new(ScriptedRecognizer::new("алгебра отлично (5)")));
    profiles.register("applicant-1");
    let router = extraction_router(Arc::new(manager));

    let response = router
        .clone()
        .oneshot(submit_request("applicant-1", encode(&png_page(32))))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    let job_id = payload["job_id"].as_str().expect("job id").to_string();

    for _ in 0..500 {
        let response = router
            .clone()
            .oneshot(
                axum::http::Request::get(format!("/api/v1/extraction-jobs/{job_id}"))
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = read_json_body(response).await;
        if payload["status"] == "succeeded" {
            assert_eq!(payload["result"], json!(5.0));
            return;
        }
        assert_eq!(payload["status"], "pending");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never reached a terminal state");
}
