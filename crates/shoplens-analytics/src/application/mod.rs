//! Application layer for aggregation queries.

pub mod query_handlers;
