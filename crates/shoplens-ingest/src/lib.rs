//! ShopLens analytics — event ingestion.
//!
//! Turns validated tracking events into TTL-scoped mutations of the
//! aggregation key-space and hands them to the durable log.

pub mod application;
pub mod domain;
