//! Query handlers for analytics.
//!
//! These assemble the served payloads from fresh scans of the key-space and
//! return read-only view DTOs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use shoplens_core::clock::Clock;
use shoplens_core::error::AnalyticsError;
use shoplens_core::store::AggregationStore;

use crate::domain::scanner::{self, EntityCount};
use crate::domain::top_k::{DEFAULT_K, top_k};

/// Default number of keys requested per scan batch.
pub const DEFAULT_SCAN_BATCH: usize = 1000;

/// Tunables of the query path.
#[derive(Debug, Clone, Copy)]
pub struct QuerySettings {
    /// Number of products in `top_products`.
    pub top_k: usize,
    /// Keys requested per scan batch.
    pub scan_batch: usize,
    /// Retention window of the key-space, reported alongside results.
    pub window: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_K,
            scan_batch: DEFAULT_SCAN_BATCH,
            window: Duration::from_secs(30 * 60 * 60),
        }
    }
}

/// One ranked product with best-effort details.
///
/// Details come from a single sampled event of the product, so they describe
/// that event, not the product as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    /// Distinct event types seen for the product.
    pub event_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// `price × quantity` of the sampled event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approximate_revenue: Option<f64>,
}

/// The analytics payload served by the summary endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub top_products: Vec<ProductSummary>,
    /// Sum of `event_count` over every product in the window.
    pub total_events: u64,
    /// Sum of the top products' sampled revenues.
    pub total_approximate_revenue: f64,
    /// Always `true`: revenue is sampled, not summed over purchases.
    pub revenue_is_approximate: bool,
    /// Event type → number of distinct user/product records.
    pub popular_events: BTreeMap<String, u64>,
    /// Category → distinct event types.
    pub categories: BTreeMap<String, u64>,
    pub window_hours: u64,
    /// Epoch seconds at which the scan ran.
    pub generated_at: i64,
}

/// Builds the full analytics summary from a fresh scan of the key-space.
///
/// # Errors
///
/// Returns `AnalyticsError::Query` if any scan or key read fails.
pub async fn get_summary(
    store: &dyn AggregationStore,
    settings: &QuerySettings,
    clock: &dyn Clock,
) -> Result<AnalyticsSummary, AnalyticsError> {
    let products = scanner::scan_products(store, settings.scan_batch).await?;
    let total_events: u64 = products.iter().map(|p| p.count).sum();
    let product_count = products.len();

    let mut top_products = Vec::new();
    for ranked in top_k(products, settings.top_k) {
        top_products.push(enrich(store, ranked, settings.scan_batch).await?);
    }
    let total_approximate_revenue: f64 = top_products
        .iter()
        .filter_map(|p| p.approximate_revenue)
        .sum();

    let popular_events = into_map(scanner::scan_popular_events(store, settings.scan_batch).await?);
    let categories = into_map(scanner::scan_categories(store, settings.scan_batch).await?);

    info!(
        products = product_count,
        total_events,
        categories = categories.len(),
        "analytics summary assembled"
    );

    Ok(AnalyticsSummary {
        top_products,
        total_events,
        total_approximate_revenue,
        revenue_is_approximate: true,
        popular_events,
        categories,
        window_hours: settings.window.as_secs() / 3600,
        generated_at: clock.now().timestamp(),
    })
}

/// Search query → occurrences within the window.
///
/// # Errors
///
/// Returns `AnalyticsError::Query` if any scan or key read fails.
pub async fn get_search_terms(
    store: &dyn AggregationStore,
    settings: &QuerySettings,
) -> Result<BTreeMap<String, u64>, AnalyticsError> {
    Ok(into_map(
        scanner::scan_search_terms(store, settings.scan_batch).await?,
    ))
}

async fn enrich(
    store: &dyn AggregationStore,
    ranked: EntityCount,
    batch: usize,
) -> Result<ProductSummary, AnalyticsError> {
    let mut summary = ProductSummary {
        product_id: ranked.id,
        event_count: ranked.count,
        product_name: None,
        category: None,
        price: None,
        quantity: None,
        approximate_revenue: None,
    };
    if let Some(sample) = scanner::sample_product_record(store, &summary.product_id, batch).await? {
        summary.approximate_revenue = sample.revenue();
        summary.product_name = sample.product_name;
        summary.category = sample.category;
        summary.price = sample.price;
        summary.quantity = sample.quantity;
    }
    Ok(summary)
}

fn into_map(entities: Vec<EntityCount>) -> BTreeMap<String, u64> {
    entities.into_iter().map(|e| (e.id, e.count)).collect()
}
