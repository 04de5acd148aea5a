//! Shared test doubles for ShopLens analytics.

mod clock;
mod event;
mod forwarder;
mod store;

pub use clock::{FixedClock, ManualClock};
pub use event::{FIXTURE_TIMESTAMP, sample_event};
pub use forwarder::{FailingForwarder, RecordingForwarder, StalledForwarder};
pub use store::{FailOnPrefixStore, FailingStore};
