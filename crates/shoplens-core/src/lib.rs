//! ShopLens Core — shared analytics abstractions.
//!
//! This crate defines the event model, the aggregation key-space and the
//! traits the ingestion and query pipelines depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod event;
pub mod forwarder;
pub mod keys;
pub mod store;
