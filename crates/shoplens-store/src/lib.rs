//! ShopLens Store — in-process implementation of the aggregation store.
//!
//! Keys live in an ordered map guarded by a mutex. Each trait call takes the
//! lock once, so a mutation and its TTL reset are atomic for that key, and a
//! scan batch holds the lock for at most `count` entries.

pub mod memory_store;

pub use memory_store::MemoryStore;
