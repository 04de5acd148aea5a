//! Command handlers for event ingestion.
//!
//! `handle_track` runs the whole ingestion path for one request: validate,
//! write the key-space, then forward to the durable log. Indexing happens
//! first; an event whose forward fails stays indexed.

use std::time::Duration;

use tracing::{info, warn};

use shoplens_core::clock::Clock;
use shoplens_core::error::{AnalyticsError, ForwardError};
use shoplens_core::event::{Event, RawEvent, normalize};
use shoplens_core::forwarder::EventForwarder;
use shoplens_core::store::AggregationStore;

use crate::domain::key_space;

/// Default sliding retention window of the key-space.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 60 * 60);

/// Default upper bound on waiting for the durable log.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables of the ingestion path.
#[derive(Debug, Clone, Copy)]
pub struct IngestSettings {
    /// TTL applied to every key the event touches.
    pub window: Duration,
    /// How long to wait for the durable log before reporting failure.
    pub forward_timeout: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
        }
    }
}

/// Handles a tracking request: normalizes `raw`, writes it into the
/// key-space and forwards it to the durable log.
///
/// Returns the stored event on success.
///
/// # Errors
///
/// Returns `AnalyticsError::Validation` for bad input (nothing is written),
/// `AnalyticsError::Index` if the key-space write fails (nothing is
/// forwarded), and `AnalyticsError::Forward` if the durable log fails or does
/// not answer within `settings.forward_timeout` (the event stays indexed).
pub async fn handle_track(
    raw: RawEvent,
    settings: &IngestSettings,
    clock: &dyn Clock,
    store: &dyn AggregationStore,
    forwarder: &dyn EventForwarder,
) -> Result<Event, AnalyticsError> {
    let event = normalize(raw, clock)?;

    key_space::write_event(store, &event, settings.window)
        .await
        .inspect_err(|e| {
            warn!(event_id = %event.event_id, step = %e.step, error = %e.source, "key-space write failed");
        })?;

    tokio::time::timeout(settings.forward_timeout, forwarder.forward(&event))
        .await
        .map_err(|_| ForwardError::Timeout(settings.forward_timeout))
        .and_then(|forwarded| forwarded)
        .inspect_err(|e| {
            warn!(event_id = %event.event_id, error = %e, "event indexed but not forwarded");
        })?;

    info!(
        event_id = %event.event_id,
        event_type = %event.event_type,
        product_id = event.product_id.as_deref().unwrap_or(""),
        "event tracked"
    );
    Ok(event)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use shoplens_core::clock::Clock;
    use shoplens_core::error::{AnalyticsError, ForwardError, ValidationError, WriteStep};
    use shoplens_core::event::RawEvent;
    use shoplens_core::keys;
    use shoplens_core::store::AggregationStore;
    use shoplens_store::MemoryStore;
    use shoplens_test_support::{
        FailingForwarder, FailingStore, FixedClock, RecordingForwarder, StalledForwarder,
    };

    use super::{IngestSettings, handle_track};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    fn raw(body: serde_json::Value) -> RawEvent {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_handle_track_indexes_then_forwards() {
        // Arrange
        let clock = clock();
        let store = MemoryStore::new(clock.clone());
        let forwarder = RecordingForwarder::new();
        let settings = IngestSettings::default();

        // Act
        let event = handle_track(
            raw(json!({ "userId": "u1", "event": "view", "productId": "p1" })),
            &settings,
            clock.as_ref(),
            &store,
            &forwarder,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(event.timestamp, clock.now().timestamp());
        assert_eq!(store.cardinality(&keys::product_key("p1")).await.unwrap(), 1);
        let forwarded = forwarder.forwarded();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0], event);
    }

    #[tokio::test]
    async fn test_handle_track_rejects_invalid_event_before_writing() {
        let clock = clock();
        let store = MemoryStore::new(clock.clone());
        let forwarder = RecordingForwarder::new();

        let result = handle_track(
            raw(json!({ "event": "view", "productId": "p1" })),
            &IngestSettings::default(),
            clock.as_ref(),
            &store,
            &forwarder,
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            AnalyticsError::Validation(ValidationError::MissingField("userId"))
        ));
        assert_eq!(store.cardinality(&keys::product_key("p1")).await.unwrap(), 0);
        assert!(forwarder.forwarded().is_empty());
    }

    #[tokio::test]
    async fn test_handle_track_does_not_forward_when_index_fails() {
        let clock = clock();
        let forwarder = RecordingForwarder::new();

        let result = handle_track(
            raw(json!({ "userId": "u1", "event": "view", "productId": "p1" })),
            &IngestSettings::default(),
            clock.as_ref(),
            &FailingStore,
            &forwarder,
        )
        .await;

        match result.unwrap_err() {
            AnalyticsError::Index(err) => assert_eq!(err.step, WriteStep::PrimaryRecord),
            other => panic!("expected Index, got {other:?}"),
        }
        assert!(forwarder.forwarded().is_empty());
    }

    #[tokio::test]
    async fn test_handle_track_reports_forward_failure_after_indexing() {
        let clock = clock();
        let store = MemoryStore::new(clock.clone());

        let result = handle_track(
            raw(json!({ "userId": "u1", "event": "view", "productId": "p1" })),
            &IngestSettings::default(),
            clock.as_ref(),
            &store,
            &FailingForwarder,
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            AnalyticsError::Forward(ForwardError::Unreachable(_))
        ));
        assert_eq!(store.cardinality(&keys::product_key("p1")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_handle_track_times_out_stalled_forwarder() {
        let clock = clock();
        let store = MemoryStore::new(clock.clone());
        let settings = IngestSettings {
            forward_timeout: Duration::from_millis(20),
            ..IngestSettings::default()
        };

        let result = handle_track(
            raw(json!({ "userId": "u1", "event": "search", "searchQuery": "boots" })),
            &settings,
            clock.as_ref(),
            &store,
            &StalledForwarder(Duration::from_secs(5)),
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            AnalyticsError::Forward(ForwardError::Timeout(t)) if t == Duration::from_millis(20)
        ));
        assert_eq!(
            store.counter(&keys::search_key("boots")).await.unwrap(),
            Some(1)
        );
    }
}
