//! Durable forwarder abstraction.

use async_trait::async_trait;

use crate::error::ForwardError;
use crate::event::Event;

/// Hands events to an external durable log.
///
/// Implementations provide at-least-once delivery and own any retry policy.
/// The ingestion pipeline calls this after the key-space write, without any
/// transaction spanning the two.
#[async_trait]
pub trait EventForwarder: Send + Sync {
    /// Deliver one event to the durable log.
    async fn forward(&self, event: &Event) -> Result<(), ForwardError>;
}
