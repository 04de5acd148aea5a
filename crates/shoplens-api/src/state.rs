//! Shared application state.

use std::sync::Arc;

use shoplens_analytics::application::query_handlers::QuerySettings;
use shoplens_core::clock::Clock;
use shoplens_core::forwarder::EventForwarder;
use shoplens_core::store::AggregationStore;
use shoplens_ingest::application::command_handlers::IngestSettings;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for event timestamps and report generation time.
    pub clock: Arc<dyn Clock>,
    /// The TTL-scoped key-space.
    pub store: Arc<dyn AggregationStore>,
    /// Delivery to the durable log.
    pub forwarder: Arc<dyn EventForwarder>,
    pub ingest: IngestSettings,
    pub query: QuerySettings,
}

impl AppState {
    /// Create new application state with default settings.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<dyn AggregationStore>,
        forwarder: Arc<dyn EventForwarder>,
    ) -> Self {
        Self {
            clock,
            store,
            forwarder,
            ingest: IngestSettings::default(),
            query: QuerySettings::default(),
        }
    }

    /// Replace the ingestion and query tunables.
    #[must_use]
    pub fn with_settings(mut self, ingest: IngestSettings, query: QuerySettings) -> Self {
        self.ingest = ingest;
        self.query = query;
        self
    }
}
