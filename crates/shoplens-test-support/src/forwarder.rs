//! Test forwarders — `EventForwarder` doubles for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use shoplens_core::error::ForwardError;
use shoplens_core::event::Event;
use shoplens_core::forwarder::EventForwarder;

/// A forwarder that accepts everything and remembers what it was given.
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    forwarded: Mutex<Vec<Event>>,
}

impl RecordingForwarder {
    /// Create an empty recording forwarder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all forwarded events, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn forwarded(&self) -> Vec<Event> {
        self.forwarded.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventForwarder for RecordingForwarder {
    async fn forward(&self, event: &Event) -> Result<(), ForwardError> {
        self.forwarded.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A forwarder whose durable log is always unreachable.
#[derive(Debug)]
pub struct FailingForwarder;

#[async_trait]
impl EventForwarder for FailingForwarder {
    async fn forward(&self, _event: &Event) -> Result<(), ForwardError> {
        Err(ForwardError::Unreachable("broker connection refused".into()))
    }
}

/// A forwarder that sleeps for the given duration before succeeding. Used to
/// exercise the forwarding deadline.
#[derive(Debug)]
pub struct StalledForwarder(pub Duration);

#[async_trait]
impl EventForwarder for StalledForwarder {
    async fn forward(&self, _event: &Event) -> Result<(), ForwardError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}
