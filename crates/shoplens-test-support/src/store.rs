//! Test stores — `AggregationStore` doubles for failure paths.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shoplens_core::error::StoreError;
use shoplens_core::store::{AggregationStore, ScanCursor, ScanPage};

fn refused() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

/// A store that fails every operation. Useful for testing error-handling
/// paths.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl AggregationStore for FailingStore {
    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(refused())
    }

    async fn add_member(
        &self,
        _key: &str,
        _member: &str,
        _ttl: Duration,
    ) -> Result<bool, StoreError> {
        Err(refused())
    }

    async fn members(&self, _key: &str) -> Result<BTreeSet<String>, StoreError> {
        Err(refused())
    }

    async fn cardinality(&self, _key: &str) -> Result<u64, StoreError> {
        Err(refused())
    }

    async fn increment(&self, _key: &str, _ttl: Duration) -> Result<i64, StoreError> {
        Err(refused())
    }

    async fn counter(&self, _key: &str) -> Result<Option<i64>, StoreError> {
        Err(refused())
    }

    async fn time_to_live(&self, _key: &str) -> Result<Option<Duration>, StoreError> {
        Err(refused())
    }

    async fn scan(
        &self,
        _cursor: &ScanCursor,
        _pattern: &str,
        _count: usize,
    ) -> Result<ScanPage, StoreError> {
        Err(refused())
    }
}

/// Delegates to an inner store but fails every access to keys starting with
/// `prefix`. Lets a test break one step of a multi-key write or one key of a
/// scan while the rest of the key-space keeps working.
pub struct FailOnPrefixStore {
    inner: Arc<dyn AggregationStore>,
    prefix: String,
}

impl FailOnPrefixStore {
    /// Wrap `inner`, failing keys that start with `prefix`.
    #[must_use]
    pub fn new(inner: Arc<dyn AggregationStore>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if key.starts_with(&self.prefix) {
            Err(refused())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AggregationStore for FailOnPrefixStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.put(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.check(key)?;
        self.inner.add_member(key, member, ttl).await
    }

    async fn members(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        self.check(key)?;
        self.inner.members(key).await
    }

    async fn cardinality(&self, key: &str) -> Result<u64, StoreError> {
        self.check(key)?;
        self.inner.cardinality(key).await
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        self.check(key)?;
        self.inner.increment(key, ttl).await
    }

    async fn counter(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.check(key)?;
        self.inner.counter(key).await
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.check(key)?;
        self.inner.time_to_live(key).await
    }

    async fn scan(
        &self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        self.inner.scan(cursor, pattern, count).await
    }
}
