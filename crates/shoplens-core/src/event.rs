//! The tracked-event model and its validation contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ValidationError;

/// Open, schema-less metadata value attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// JSON `null`.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// Any JSON number, kept with its original precision.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<MetadataValue>),
    /// A nested mapping.
    Map(BTreeMap<String, MetadataValue>),
}

/// A product reference as clients send it: storefronts use either string or
/// numeric identifiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    /// `"productId": "sku-42"`
    Text(String),
    /// `"productId": 42`
    Number(serde_json::Number),
}

impl ProductRef {
    /// Canonical string form used in keys and records.
    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Text(id) => id,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// An event as received at the ingestion boundary, before validation.
///
/// Client-supplied timestamps and unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(alias = "userID")]
    pub user_id: Option<String>,
    #[serde(rename = "event", alias = "eventType")]
    pub event_type: Option<String>,
    #[serde(alias = "productID")]
    pub product_id: Option<ProductRef>,
    pub product_name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub category: Option<String>,
    pub search_query: Option<String>,
    pub page: Option<String>,
    pub metadata: Option<BTreeMap<String, MetadataValue>>,
}

/// A validated, server-stamped interaction event.
///
/// This is also the JSON shape of the primary record and of the payload sent
/// to the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Assigned at ingestion; lets durable-log consumers drop redeliveries.
    pub event_id: Uuid,
    pub user_id: String,
    #[serde(rename = "event")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetadataValue>,
    /// Epoch seconds, taken from the server clock.
    pub timestamp: i64,
}

impl Event {
    /// `price × quantity` of this single event, if both are known.
    #[must_use]
    pub fn revenue(&self) -> Option<f64> {
        Some(self.price? * f64::from(self.quantity?))
    }
}

/// Validates a raw event and stamps it with an id and the current time.
///
/// Optional text fields that are blank are treated as absent, so they never
/// produce an index entry.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` if `userId` or `event` is missing
/// or blank, and `ValidationError::InvalidField` if `price` is negative or not
/// finite.
pub fn normalize(raw: RawEvent, clock: &dyn Clock) -> Result<Event, ValidationError> {
    let user_id = required(raw.user_id, "userId")?;
    let event_type = required(raw.event_type, "event")?;

    if let Some(price) = raw.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "price",
                reason: format!("must be a non-negative number, got {price}"),
            });
        }
    }

    Ok(Event {
        event_id: Uuid::new_v4(),
        user_id,
        event_type,
        product_id: present(raw.product_id.map(ProductRef::into_id)),
        product_name: present(raw.product_name),
        price: raw.price,
        quantity: raw.quantity,
        category: present(raw.category),
        search_query: present(raw.search_query),
        page: present(raw.page),
        metadata: raw.metadata.unwrap_or_default(),
        timestamp: clock.now().timestamp(),
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    present(value).ok_or(ValidationError::MissingField(field))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
