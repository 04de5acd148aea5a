//! Route modules: ingestion, analytics queries and health.

pub mod analyze;
pub mod health;
pub mod track;
