//! ShopLens analytics — aggregation queries.
//!
//! Every query rebuilds its answer by scanning the key-space; nothing is
//! cached between requests.

pub mod application;
pub mod domain;
