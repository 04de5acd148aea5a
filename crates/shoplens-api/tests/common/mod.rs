//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use shoplens_core::clock::Clock;
use shoplens_store::MemoryStore;
use shoplens_test_support::{ManualClock, RecordingForwarder};
use tower::ServiceExt;

use shoplens_api::build_router;
use shoplens_api::state::AppState;

/// Start time used across all integration tests.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A running app over a fresh in-memory store, with handles on its clock
/// and forwarder.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub forwarder: Arc<RecordingForwarder>,
}

/// Build the full app router the same way `main.rs` does, with a manual
/// clock and a recording forwarder.
pub fn build_test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(start_time()));
    let forwarder = Arc::new(RecordingForwarder::new());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let store = Arc::new(MemoryStore::new(dyn_clock.clone()));
    let state = AppState::new(dyn_clock, store, forwarder.clone());

    TestApp {
        router: build_router(state),
        clock,
        forwarder,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
