//! Event fixtures.

use std::collections::BTreeMap;

use shoplens_core::event::Event;
use uuid::Uuid;

/// Epoch seconds of 2026-01-15T10:00:00Z, the fixture time used across tests.
pub const FIXTURE_TIMESTAMP: i64 = 1_768_471_200;

/// A minimal valid event; set further fields on the returned value.
#[must_use]
pub fn sample_event(user_id: &str, event_type: &str, product_id: Option<&str>) -> Event {
    Event {
        event_id: Uuid::new_v4(),
        user_id: user_id.to_owned(),
        event_type: event_type.to_owned(),
        product_id: product_id.map(str::to_owned),
        product_name: None,
        price: None,
        quantity: None,
        category: None,
        search_query: None,
        page: None,
        metadata: BTreeMap::new(),
        timestamp: FIXTURE_TIMESTAMP,
    }
}
