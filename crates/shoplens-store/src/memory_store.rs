//! Mutex-guarded `BTreeMap` implementation of `AggregationStore`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use shoplens_core::clock::Clock;
use shoplens_core::error::StoreError;
use shoplens_core::store::{AggregationStore, ScanCursor, ScanPage, matches_pattern};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Set(BTreeSet<String>),
    Counter(i64),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Set(_) => "set",
            Self::Counter(_) => "counter",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

type Entries = BTreeMap<String, Entry>;

/// Aggregation store held in process memory.
///
/// Expired keys are invisible to every read. Their memory is reclaimed when
/// a later access touches them or when [`MemoryStore::purge_expired`] runs.
pub struct MemoryStore {
    entries: Mutex<Entries>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    /// Drops every expired entry and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the store lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        debug!(removed, remaining = entries.len(), "purged expired keys");
        Ok(removed)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the live value at `key`, removing it first if it has expired.
    fn live<'a>(entries: &'a mut Entries, key: &str, now: DateTime<Utc>) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn wrong_type(key: &str, expected: &'static str, found: &Value) -> StoreError {
        StoreError::WrongType {
            key: key.to_owned(),
            expected,
            found: found.kind(),
        }
    }
}

#[async_trait]
impl AggregationStore for MemoryStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        entries.insert(
            key.to_owned(),
            Entry {
                value: Value::Text(value),
                expires_at: Self::expiry(now, ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live(&mut entries, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(entry) => Err(Self::wrong_type(key, "string", &entry.value)),
        }
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let expires_at = Self::expiry(now, ttl);
        match Self::live(&mut entries, key, now) {
            None => {
                entries.insert(
                    key.to_owned(),
                    Entry {
                        value: Value::Set(BTreeSet::from([member.to_owned()])),
                        expires_at,
                    },
                );
                Ok(true)
            }
            Some(Entry {
                value: Value::Set(members),
                expires_at: current,
            }) => {
                *current = expires_at;
                Ok(members.insert(member.to_owned()))
            }
            Some(entry) => Err(Self::wrong_type(key, "set", &entry.value)),
        }
    }

    async fn members(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live(&mut entries, key, now) {
            None => Ok(BTreeSet::new()),
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.clone()),
            Some(entry) => Err(Self::wrong_type(key, "set", &entry.value)),
        }
    }

    async fn cardinality(&self, key: &str) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live(&mut entries, key, now) {
            None => Ok(0),
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.len() as u64),
            Some(entry) => Err(Self::wrong_type(key, "set", &entry.value)),
        }
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let expires_at = Self::expiry(now, ttl);
        match Self::live(&mut entries, key, now) {
            None => {
                entries.insert(
                    key.to_owned(),
                    Entry {
                        value: Value::Counter(1),
                        expires_at,
                    },
                );
                Ok(1)
            }
            Some(Entry {
                value: Value::Counter(count),
                expires_at: current,
            }) => {
                let next = count.checked_add(1).ok_or_else(|| StoreError::Corrupt {
                    key: key.to_owned(),
                    reason: "counter overflow".into(),
                })?;
                *count = next;
                *current = expires_at;
                Ok(next)
            }
            Some(entry) => Err(Self::wrong_type(key, "counter", &entry.value)),
        }
    }

    async fn counter(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match Self::live(&mut entries, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Counter(count),
                ..
            }) => Ok(Some(*count)),
            Some(entry) => Err(Self::wrong_type(key, "counter", &entry.value)),
        }
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        Ok(Self::live(&mut entries, key, now)
            .and_then(|entry| (entry.expires_at - now).to_std().ok()))
    }

    async fn scan(
        &self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        let now = self.clock.now();
        let entries = self.lock()?;
        let lower = cursor.token().map_or(Bound::Unbounded, Bound::Excluded);
        let mut range = entries.range::<str, _>((lower, Bound::Unbounded));

        let mut keys = Vec::new();
        let mut last_examined = None;
        for (key, entry) in range.by_ref().take(count.max(1)) {
            last_examined = Some(key);
            if entry.expires_at > now && matches_pattern(pattern, key) {
                keys.push(key.clone());
            }
        }

        let next = match last_examined {
            Some(last) if range.next().is_some() => ScanCursor::resume(last.as_str()),
            _ => ScanCursor::start(),
        };
        Ok(ScanPage { keys, next })
    }
}
