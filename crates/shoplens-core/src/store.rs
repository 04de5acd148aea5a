//! Aggregation store client abstraction.
//!
//! The store is a TTL-scoped key/value space holding three value kinds:
//! strings, sets of strings and integer counters. Every mutation takes a
//! `ttl` and resets the key's expiry to `now + ttl`. Each call is atomic for
//! its single key; nothing spans keys.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Resumption token for [`AggregationStore::scan`].
///
/// Iteration starts from [`ScanCursor::start`] and is complete when the store
/// hands the start cursor back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanCursor(Option<String>);

impl ScanCursor {
    /// The cursor that begins (and ends) a full iteration.
    #[must_use]
    pub fn start() -> Self {
        Self(None)
    }

    /// A cursor resuming after `token`. The token's meaning belongs to the
    /// store implementation.
    #[must_use]
    pub fn resume(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Whether this is the start cursor.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// The resumption token, absent for the start cursor.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// One bounded batch of a key scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Matching keys in this batch. A key may show up in more than one batch
    /// if the key-space changes during iteration.
    pub keys: Vec<String>,
    /// Where to continue; the start cursor once iteration is complete.
    pub next: ScanCursor,
}

/// Client interface to the aggregation store.
#[async_trait]
pub trait AggregationStore: Send + Sync {
    /// Overwrite the string value at `key`.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Read the string value at `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Add `member` to the set at `key`. Returns `true` if it was not
    /// already a member.
    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// All members of the set at `key`; empty if absent.
    async fn members(&self, key: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Number of members of the set at `key`; zero if absent.
    async fn cardinality(&self, key: &str) -> Result<u64, StoreError>;

    /// Increment the counter at `key` (absent counts as zero) and return the
    /// new value.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;

    /// Current value of the counter at `key`, `None` if absent.
    async fn counter(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Remaining lifetime of `key`, `None` if absent.
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Return up to roughly `count` keys matching `pattern`, continuing from
    /// `cursor`. Never holds the store for longer than one batch.
    async fn scan(
        &self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError>;
}

/// Glob match where `*` stands for any run of characters, including none.
/// Every other character matches itself.
#[must_use]
pub fn matches_pattern(pattern: &str, key: &str) -> bool {
    let pattern = pattern.as_bytes();
    let key = key.as_bytes();
    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, k));
            p += 1;
        } else if p < pattern.len() && pattern[p] == key[k] {
            p += 1;
            k += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            k = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&b| b == b'*')
}
