//! Forwarder used when no durable log is configured.

use async_trait::async_trait;
use tracing::info;

use shoplens_core::error::ForwardError;
use shoplens_core::event::Event;
use shoplens_core::forwarder::EventForwarder;

/// Writes each event to the service log and reports success. Nothing is
/// durable; meant for local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogForwarder;

#[async_trait]
impl EventForwarder for LogForwarder {
    async fn forward(&self, event: &Event) -> Result<(), ForwardError> {
        info!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            event_type = %event.event_type,
            "no durable log configured; event logged only"
        );
        Ok(())
    }
}
