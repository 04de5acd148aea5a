//! Domain layer for ingestion.

pub mod key_space;
