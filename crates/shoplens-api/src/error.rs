//! ShopLens — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shoplens_core::error::AnalyticsError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The durable log client could not be built.
    #[error("forwarder error: {0}")]
    Forwarder(#[from] reqwest::Error),

    /// Tracing or trace export could not be initialized.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Pipeline stage that failed.
    pub stage: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `AnalyticsError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub AnalyticsError);

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            AnalyticsError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AnalyticsError::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "index_failed"),
            AnalyticsError::Forward(_) => (StatusCode::INTERNAL_SERVER_ERROR, "forward_failed"),
            AnalyticsError::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "query_failed"),
        };

        let body = ErrorBody {
            error: error_code,
            stage: self.0.stage(),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
