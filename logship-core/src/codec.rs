//! Document codec
//!
//! Serializes batches of [`LogEntry`] into the JSON document accepted by the
//! remote store:
//!
//! ```text
//! {
//!   "device_id": "...",
//!   "bundle_id": "...",
//!   "type": "client-logs",
//!   "logs": [ { "date": "2026-01-21 14:13:48.123", "log": "..." } ]
//! }
//! ```
//!
//! Encoding is all-or-nothing: a batch that cannot be represented yields an
//! error and no bytes.

use chrono::{DateTime, Datelike, Local, Utc};
use thiserror::Error;

use crate::domain::document::LogDocument;
use crate::domain::log::LogEntry;

/// Value of the `type` field of every document
pub const DOCUMENT_TYPE: &str = "client-logs";

/// `yyyy-MM-dd HH:mm:ss.SSS`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Errors raised while building, encoding or decoding a document
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Cannot encode an empty batch")]
    EmptyBatch,

    /// The date format only has room for four-digit years
    #[error("Entry {index} has a timestamp outside the representable range")]
    UnrepresentableTimestamp { index: usize },

    #[error("Unexpected document type: {0}")]
    UnexpectedType(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Formats a timestamp for the `date` field, or `None` if it does not fit
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> Option<String> {
    let local = timestamp.with_timezone(&Local);
    if !(0..=9999).contains(&local.year()) {
        return None;
    }
    Some(local.format(DATE_FORMAT).to_string())
}

/// Serializes a document to bytes
pub fn encode(document: &LogDocument) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(document)?)
}

/// Builds a document from `entries` and serializes it in one step
pub fn encode_entries(
    device_id: &str,
    bundle_id: &str,
    entries: &[LogEntry],
) -> Result<Vec<u8>, CodecError> {
    let document = LogDocument::from_entries(device_id, bundle_id, entries)?;
    encode(&document)
}

/// Parses bytes produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<LogDocument, CodecError> {
    let document: LogDocument = serde_json::from_slice(bytes)?;
    if document.doc_type != DOCUMENT_TYPE {
        return Err(CodecError::UnexpectedType(document.doc_type));
    }
    Ok(document)
}
