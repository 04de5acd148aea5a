//! Routes for analytics queries. Every request rescans the key-space.

use std::collections::BTreeMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use shoplens_analytics::application::query_handlers::{self, AnalyticsSummary};
use shoplens_core::error::ValidationError;

use crate::config::MAX_TOP_K;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the summary endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// Number of top products to return, capped at [`MAX_TOP_K`].
    pub limit: Option<usize>,
}

/// Response body of GET /search.
#[derive(Debug, Serialize)]
pub struct SearchTermsResponse {
    pub search_terms: BTreeMap<String, u64>,
}

/// GET /products and GET /summary
#[instrument(skip(state, params))]
async fn summary(
    State(state): State<AppState>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let Query(params) = params.map_err(|rejection| {
        ApiError(ValidationError::Malformed(rejection.body_text()).into())
    })?;

    let mut settings = state.query;
    if let Some(limit) = params.limit {
        settings.top_k = limit.min(MAX_TOP_K);
    }

    info!(correlation_id = %correlation_id, top_k = settings.top_k, "handling summary query");

    let summary =
        query_handlers::get_summary(state.store.as_ref(), &settings, state.clock.as_ref()).await?;

    Ok(Json(summary))
}

/// GET /search
#[instrument(skip(state))]
async fn search_terms(
    State(state): State<AppState>,
) -> Result<Json<SearchTermsResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();

    info!(correlation_id = %correlation_id, "handling search terms query");

    let search_terms = query_handlers::get_search_terms(state.store.as_ref(), &state.query).await?;

    Ok(Json(SearchTermsResponse { search_terms }))
}

/// Returns the router for analytics queries.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(summary))
        .route("/summary", get(summary))
        .route("/search", get(search_terms))
}
