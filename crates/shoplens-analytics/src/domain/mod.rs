//! Domain layer for aggregation queries.

pub mod scanner;
pub mod top_k;
