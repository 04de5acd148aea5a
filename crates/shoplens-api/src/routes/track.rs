//! Routes for event ingestion.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use shoplens_core::error::ValidationError;
use shoplens_core::event::RawEvent;
use shoplens_ingest::application::command_handlers;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body returned after an event is tracked.
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub message: &'static str,
    /// Identifier assigned to the event; also carried on the durable log.
    pub event_id: Uuid,
    /// Server-assigned event time, epoch seconds.
    pub timestamp: i64,
}

/// POST /track
#[instrument(skip(state, payload))]
async fn track(
    State(state): State<AppState>,
    payload: Result<Json<RawEvent>, JsonRejection>,
) -> Result<Json<TrackResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let Json(raw) = payload.map_err(|rejection| {
        ApiError(ValidationError::Malformed(rejection.body_text()).into())
    })?;

    info!(correlation_id = %correlation_id, "handling track command");

    let event = command_handlers::handle_track(
        raw,
        &state.ingest,
        state.clock.as_ref(),
        state.store.as_ref(),
        state.forwarder.as_ref(),
    )
    .await?;

    Ok(Json(TrackResponse {
        message: "Event tracked successfully",
        event_id: event.event_id,
        timestamp: event.timestamp,
    }))
}

/// Returns the router for event ingestion.
pub fn router() -> Router<AppState> {
    Router::new().route("/track", post(track))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use shoplens_analytics::application::query_handlers::QuerySettings;
    use shoplens_core::clock::Clock;
    use shoplens_core::forwarder::EventForwarder;
    use shoplens_core::store::AggregationStore;
    use shoplens_ingest::application::command_handlers::IngestSettings;
    use shoplens_store::MemoryStore;
    use shoplens_test_support::{
        FailingForwarder, FailingStore, FixedClock, RecordingForwarder, StalledForwarder,
    };
    use tower::ServiceExt;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    fn app_state_with(
        store: Arc<dyn AggregationStore>,
        forwarder: Arc<dyn EventForwarder>,
    ) -> AppState {
        AppState::new(clock(), store, forwarder)
    }

    fn memory_state(forwarder: Arc<dyn EventForwarder>) -> AppState {
        app_state_with(Arc::new(MemoryStore::new(clock())), forwarder)
    }

    async fn post_track(state: AppState, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/track")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = router().with_state(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    fn view_body() -> Body {
        Body::from(r#"{"userId":"u1","event":"view","productId":"p1"}"#)
    }

    #[tokio::test]
    async fn test_track_returns_200_with_event_id() {
        // Arrange
        let forwarder = Arc::new(RecordingForwarder::new());
        let state = memory_state(forwarder.clone());

        // Act
        let (status, json) = post_track(state, view_body()).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Event tracked successfully");
        assert_eq!(json["timestamp"], 1_768_471_200);
        let event_id = Uuid::parse_str(json["event_id"].as_str().unwrap()).unwrap();
        let forwarded = forwarder.forwarded();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].event_id, event_id);
    }

    #[tokio::test]
    async fn test_track_returns_400_for_missing_user() {
        let state = memory_state(Arc::new(RecordingForwarder::new()));

        let (status, json) = post_track(state, Body::from(r#"{"event":"view"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["stage"], "validation");
    }

    #[tokio::test]
    async fn test_track_returns_400_for_malformed_body() {
        // Arrange
        let state = memory_state(Arc::new(RecordingForwarder::new()));

        // Act
        let (status, json) = post_track(state, Body::from("{not json")).await;

        // Assert: a JSON error body, not axum's default plain-text rejection.
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_track_returns_400_for_mistyped_field() {
        let state = memory_state(Arc::new(RecordingForwarder::new()));

        let (status, _) = post_track(
            state,
            Body::from(r#"{"userId":"u1","event":"purchase","quantity":"two"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_track_returns_500_at_index_stage_when_store_fails() {
        // Arrange
        let forwarder = Arc::new(RecordingForwarder::new());
        let state = app_state_with(Arc::new(FailingStore), forwarder.clone());

        // Act
        let (status, json) = post_track(state, view_body()).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "index_failed");
        assert_eq!(json["stage"], "index");
        assert!(forwarder.forwarded().is_empty());
    }

    #[tokio::test]
    async fn test_track_returns_500_at_forward_stage_when_log_fails() {
        let state = memory_state(Arc::new(FailingForwarder));

        let (status, json) = post_track(state, view_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "forward_failed");
        assert_eq!(json["stage"], "forward");
    }

    #[tokio::test]
    async fn test_track_returns_500_at_forward_stage_on_timeout() {
        // Arrange
        let state = memory_state(Arc::new(StalledForwarder(Duration::from_secs(5))))
            .with_settings(
                IngestSettings {
                    forward_timeout: Duration::from_millis(20),
                    ..IngestSettings::default()
                },
                QuerySettings::default(),
            );

        // Act
        let (status, json) = post_track(state, view_body()).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["stage"], "forward");
    }
}
