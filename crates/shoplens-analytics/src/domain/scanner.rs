//! Aggregation scanner.
//!
//! Walks the key-space with the store's cursor scan and rebuilds per-entity
//! counts. Entity identifiers always come from the key segments. A key that
//! expires between enumeration and read is skipped as absent; any store
//! error aborts the scan and is returned.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use shoplens_core::error::StoreError;
use shoplens_core::event::Event;
use shoplens_core::keys;
use shoplens_core::store::{AggregationStore, ScanCursor};

/// An entity identifier with its aggregated count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCount {
    pub id: String,
    pub count: u64,
}

impl EntityCount {
    #[must_use]
    pub fn new(id: impl Into<String>, count: u64) -> Self {
        Self {
            id: id.into(),
            count,
        }
    }
}

/// Enumerates every live key matching `pattern`, `batch` keys at a time.
///
/// Keys reported more than once by the store are returned once.
///
/// # Errors
///
/// Returns the first `StoreError` raised by a scan batch.
pub async fn scan_keys(
    store: &dyn AggregationStore,
    pattern: &str,
    batch: usize,
) -> Result<BTreeSet<String>, StoreError> {
    let mut keys = BTreeSet::new();
    let mut cursor = ScanCursor::start();
    let mut batches = 0_usize;
    loop {
        let page = store.scan(&cursor, pattern, batch).await?;
        batches += 1;
        keys.extend(page.keys);
        cursor = page.next;
        if cursor.is_start() {
            break;
        }
    }
    debug!(pattern, batches, keys = keys.len(), "key scan complete");
    Ok(keys)
}

/// Product id → number of distinct event types seen for it.
///
/// # Errors
///
/// Returns `StoreError` if enumerating or reading any product index fails.
pub async fn scan_products(
    store: &dyn AggregationStore,
    batch: usize,
) -> Result<Vec<EntityCount>, StoreError> {
    set_cardinalities(store, keys::PRODUCT_PATTERN, keys::parse_product_key, batch).await
}

/// Category → number of distinct event types seen for it.
///
/// # Errors
///
/// Returns `StoreError` if enumerating or reading any category index fails.
pub async fn scan_categories(
    store: &dyn AggregationStore,
    batch: usize,
) -> Result<Vec<EntityCount>, StoreError> {
    set_cardinalities(store, keys::CATEGORY_PATTERN, keys::parse_category_key, batch).await
}

/// Search query → number of times it was searched within the window.
///
/// # Errors
///
/// Returns `StoreError` if enumerating or reading any search counter fails.
pub async fn scan_search_terms(
    store: &dyn AggregationStore,
    batch: usize,
) -> Result<Vec<EntityCount>, StoreError> {
    let mut terms = Vec::new();
    for key in scan_keys(store, keys::SEARCH_PATTERN, batch).await? {
        let Some(term) = keys::parse_search_key(&key) else {
            continue;
        };
        let Some(count) = store.counter(&key).await? else {
            continue;
        };
        if let Ok(count) = u64::try_from(count) {
            terms.push(EntityCount::new(term, count));
        }
    }
    Ok(terms)
}

/// Event type → number of primary records (distinct user/product pairs)
/// carrying it.
///
/// # Errors
///
/// Returns `StoreError` if enumerating the primary records fails.
pub async fn scan_popular_events(
    store: &dyn AggregationStore,
    batch: usize,
) -> Result<Vec<EntityCount>, StoreError> {
    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    for key in scan_keys(store, keys::PRIMARY_PATTERN, batch).await? {
        if let Some(primary) = keys::parse_primary_key(&key) {
            *tally.entry(primary.event_type).or_default() += 1;
        }
    }
    Ok(tally
        .into_iter()
        .map(|(event_type, count)| EntityCount::new(event_type, count))
        .collect())
}

/// Returns one primary record of `product_id`, if any is still live.
///
/// No record is authoritative for a product, so the lexicographically first
/// key wins to keep answers stable. Records that fail to decode are skipped.
///
/// # Errors
///
/// Returns `StoreError` if enumerating or reading the records fails.
pub async fn sample_product_record(
    store: &dyn AggregationStore,
    product_id: &str,
    batch: usize,
) -> Result<Option<Event>, StoreError> {
    let pattern = keys::product_records_pattern(product_id);
    for key in scan_keys(store, &pattern, batch).await? {
        let matches = keys::parse_primary_key(&key)
            .is_some_and(|primary| primary.product_id.as_deref() == Some(product_id));
        if !matches {
            continue;
        }
        let Some(record) = store.get(&key).await? else {
            continue;
        };
        match serde_json::from_str::<Event>(&record) {
            Ok(event) => return Ok(Some(event)),
            Err(e) => warn!(key = %key, error = %e, "skipping undecodable primary record"),
        }
    }
    Ok(None)
}

async fn set_cardinalities(
    store: &dyn AggregationStore,
    pattern: &str,
    parse: fn(&str) -> Option<String>,
    batch: usize,
) -> Result<Vec<EntityCount>, StoreError> {
    let mut counts = Vec::new();
    for key in scan_keys(store, pattern, batch).await? {
        let Some(id) = parse(&key) else {
            continue;
        };
        let count = store.cardinality(&key).await?;
        if count > 0 {
            counts.push(EntityCount::new(id, count));
        }
    }
    Ok(counts)
}
