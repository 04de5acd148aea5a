//! Error taxonomy for the ingestion and query pipelines.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Malformed or incomplete tracking input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field was present but violates its type invariant.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The request body could not be read as an event.
    #[error("malformed event body: {0}")]
    Malformed(String),
}

/// Failure of a single aggregation-store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not serve the request at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The key exists but holds a different kind of value.
    #[error("key `{key}` holds a {found}, expected a {expected}")]
    WrongType {
        /// The key that was accessed.
        key: String,
        /// The value kind the operation needs.
        expected: &'static str,
        /// The value kind actually stored.
        found: &'static str,
    },

    /// A stored value could not be decoded.
    #[error("corrupt value at `{key}`: {reason}")]
    Corrupt {
        /// The key holding the value.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

/// Failure handing an event to the durable log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The durable log could not be reached.
    #[error("durable log unreachable: {0}")]
    Unreachable(String),

    /// The durable log answered but refused the record.
    #[error("durable log rejected the event with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the sink.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// No acknowledgement arrived within the forwarding deadline.
    #[error("durable log did not acknowledge within {0:?}")]
    Timeout(Duration),

    /// The event could not be encoded for the sink.
    #[error("event encoding failed: {0}")]
    Encoding(String),
}

/// The mutation of the key-space writer that was executing when a write
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// `event:{type}:{user}:{product}`
    PrimaryRecord,
    /// `product:{product}`
    ProductIndex,
    /// `user:{user}:product:{product}`
    UserProductIndex,
    /// `category:{category}`
    CategoryIndex,
    /// `search:{query}`
    SearchCounter,
}

impl WriteStep {
    /// Stable snake-case name used in logs and error bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryRecord => "primary_record",
            Self::ProductIndex => "product_index",
            Self::UserProductIndex => "user_product_index",
            Self::CategoryIndex => "category_index",
            Self::SearchCounter => "search_counter",
        }
    }
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key-space write that stopped part way. Steps before `step` remain
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key-space write failed at {step}: {source}")]
pub struct KeySpaceWriteError {
    /// The step that failed; later steps were not attempted.
    pub step: WriteStep,
    /// The underlying store failure.
    #[source]
    pub source: StoreError,
}

/// Top-level error for tracking and analytics requests.
///
/// Each variant names the pipeline stage that failed so callers can report
/// it.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The event was rejected before touching any store.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Writing the event into the aggregation key-space failed.
    #[error("index stage failed: {0}")]
    Index(#[from] KeySpaceWriteError),

    /// The event was indexed but the durable log did not take it.
    #[error("forward stage failed: {0}")]
    Forward(#[from] ForwardError),

    /// Scanning the key-space for a query failed.
    #[error("query failed: {0}")]
    Query(#[from] StoreError),
}

impl AnalyticsError {
    /// The pipeline stage that failed.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Index(_) => "index",
            Self::Forward(_) => "forward",
            Self::Query(_) => "query",
        }
    }
}
