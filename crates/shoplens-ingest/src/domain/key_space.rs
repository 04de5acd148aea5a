//! Key-space writer: one event in, a handful of single-key mutations out.

use std::time::Duration;

use tracing::debug;

use shoplens_core::error::{KeySpaceWriteError, StoreError, WriteStep};
use shoplens_core::event::Event;
use shoplens_core::keys;
use shoplens_core::store::AggregationStore;

/// Writes `event` into the aggregation key-space, resetting the expiry of
/// every touched key to `ttl`.
///
/// Steps run in order: primary record, product index, user-product index,
/// category index, search counter. Index steps only run when the event
/// carries the field they are keyed on. The steps are independent; the first
/// failure stops the rest and nothing already written is undone.
///
/// # Errors
///
/// Returns `KeySpaceWriteError` naming the step that failed.
pub async fn write_event(
    store: &dyn AggregationStore,
    event: &Event,
    ttl: Duration,
) -> Result<(), KeySpaceWriteError> {
    let primary = keys::primary_key(&event.event_type, &event.user_id, event.product_id.as_deref());
    let record = serde_json::to_string(event).map_err(|e| KeySpaceWriteError {
        step: WriteStep::PrimaryRecord,
        source: StoreError::Corrupt {
            key: primary.clone(),
            reason: format!("event serialization failed: {e}"),
        },
    })?;

    store
        .put(&primary, record, ttl)
        .await
        .map_err(at(WriteStep::PrimaryRecord))?;

    if let Some(product_id) = event.product_id.as_deref() {
        store
            .add_member(&keys::product_key(product_id), &event.event_type, ttl)
            .await
            .map_err(at(WriteStep::ProductIndex))?;

        store
            .add_member(
                &keys::user_product_key(&event.user_id, product_id),
                &event.event_type,
                ttl,
            )
            .await
            .map_err(at(WriteStep::UserProductIndex))?;
    }

    if let Some(category) = event.category.as_deref() {
        store
            .add_member(&keys::category_key(category), &event.event_type, ttl)
            .await
            .map_err(at(WriteStep::CategoryIndex))?;
    }

    if let Some(query) = event.search_query.as_deref() {
        let count = store
            .increment(&keys::search_key(query), ttl)
            .await
            .map_err(at(WriteStep::SearchCounter))?;
        debug!(query, count, "search counter incremented");
    }

    Ok(())
}

fn at(step: WriteStep) -> impl FnOnce(StoreError) -> KeySpaceWriteError {
    move |source| KeySpaceWriteError { step, source }
}
