//! HTTP forwarder for a REST-fronted durable log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

use shoplens_core::error::ForwardError;
use shoplens_core::event::Event;
use shoplens_core::forwarder::EventForwarder;

/// Topic events are published to unless configured otherwise.
pub const DEFAULT_TOPIC: &str = "ecommerce-analytics";

const RECORDS_CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: [Record<'a>; 1],
}

#[derive(Serialize)]
struct Record<'a> {
    /// Partition key; keeps one user's events in order on the log.
    key: &'a str,
    value: &'a Event,
}

/// Publishes each event as a single record to
/// `{base_url}/topics/{topic}` using the Kafka REST produce format.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpForwarder {
    /// Create a forwarder for `topic` behind `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        topic: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into();
        Ok(Self {
            client,
            endpoint: format!("{}/topics/{topic}", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// The URL records are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventForwarder for HttpForwarder {
    async fn forward(&self, event: &Event) -> Result<(), ForwardError> {
        let body = serde_json::to_vec(&ProduceRequest {
            records: [Record {
                key: &event.user_id,
                value: event,
            }],
        })
        .map_err(|e| ForwardError::Encoding(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, RECORDS_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwardError::Timeout(self.timeout)
                } else {
                    ForwardError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                body: rejection_body(response.text().await),
            });
        }

        debug!(event_id = %event.event_id, endpoint = %self.endpoint, "event forwarded");
        Ok(())
    }
}

/// The log's error body, cut to `MAX_ERROR_BODY` bytes, or a placeholder
/// naming the read failure.
fn rejection_body<E: std::fmt::Display>(body: Result<String, E>) -> String {
    let mut body = body.unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
