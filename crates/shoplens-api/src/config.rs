//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use shoplens_analytics::application::query_handlers::{DEFAULT_SCAN_BATCH, QuerySettings};
use shoplens_analytics::domain::top_k::DEFAULT_K;
use shoplens_forwarder::DEFAULT_TOPIC;
use shoplens_ingest::application::command_handlers::IngestSettings;

use crate::error::AppError;

/// Upper bound for `?limit=` on the summary endpoints.
pub const MAX_TOP_K: usize = 100;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Sliding retention window of every key.
    pub window: Duration,
    pub top_k: usize,
    pub scan_batch: usize,
    /// How often expired entries are purged from memory.
    pub reap_interval: Duration,
    /// Base URL of the durable log's REST endpoint. Events are only logged
    /// when unset.
    pub forwarder_url: Option<String>,
    pub forwarder_topic: String,
    pub forward_timeout: Duration,
    /// OTLP collector for trace export. No export when unset.
    pub otlp_endpoint: Option<String>,
}

impl ApiConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from `lookup`, which maps a variable name to its
    /// value. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let window_hours: u64 =
            parse_positive(var("SHOPLENS_WINDOW_HOURS"), "SHOPLENS_WINDOW_HOURS", 30)?;
        let top_k: usize = parse_positive(var("SHOPLENS_TOP_K"), "SHOPLENS_TOP_K", DEFAULT_K)?;
        if top_k > MAX_TOP_K {
            return Err(AppError::Config(format!(
                "SHOPLENS_TOP_K must be at most {MAX_TOP_K}, got {top_k}"
            )));
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(var("PORT"), "PORT", 8080)?,
            window: Duration::from_secs(window_hours.saturating_mul(3600)),
            top_k,
            scan_batch: parse_positive(
                var("SHOPLENS_SCAN_BATCH"),
                "SHOPLENS_SCAN_BATCH",
                DEFAULT_SCAN_BATCH,
            )?,
            reap_interval: Duration::from_secs(parse_positive(
                var("SHOPLENS_REAP_INTERVAL_SECS"),
                "SHOPLENS_REAP_INTERVAL_SECS",
                60,
            )?),
            forwarder_url: var("SHOPLENS_FORWARDER_URL"),
            forwarder_topic: var("SHOPLENS_FORWARDER_TOPIC")
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            forward_timeout: Duration::from_millis(parse_positive(
                var("SHOPLENS_FORWARD_TIMEOUT_MS"),
                "SHOPLENS_FORWARD_TIMEOUT_MS",
                5000,
            )?),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    #[must_use]
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            window: self.window,
            forward_timeout: self.forward_timeout,
        }
    }

    #[must_use]
    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            top_k: self.top_k,
            scan_batch: self.scan_batch,
            window: self.window,
        }
    }
}

fn parse<T>(value: Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{name} must be a valid number: {e}"))),
    }
}

fn parse_positive<T>(value: Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let parsed = parse(value, name, default)?;
    if parsed == T::default() {
        return Err(AppError::Config(format!("{name} must be greater than zero")));
    }
    Ok(parsed)
}
