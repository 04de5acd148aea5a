//! ShopLens Forwarder — delivery of tracked events to the durable log.

pub mod http;
pub mod logging;

pub use http::{DEFAULT_TOPIC, HttpForwarder};
pub use logging::LogForwarder;
