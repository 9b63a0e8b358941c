//! Log document types
//!
//! A document is the unit of persistence: one drained buffer, tagged with
//! the identity of the device and application that produced it. The field
//! names here are the wire format shared by the disk files and the remote
//! store.

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, DOCUMENT_TYPE};
use crate::domain::log::LogEntry;

/// A batch of log entries plus producer identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDocument {
    pub device_id: String,
    pub bundle_id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub logs: Vec<DocumentEntry>,
}

/// One log line as it appears inside a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Local time formatted with [`codec::DATE_FORMAT`]
    pub date: String,
    pub log: String,
}

impl LogDocument {
    /// Builds a document from a drained buffer snapshot
    ///
    /// Fails without producing a partial document if the batch is empty or
    /// any entry cannot be represented in the wire format.
    pub fn from_entries(
        device_id: impl Into<String>,
        bundle_id: impl Into<String>,
        entries: &[LogEntry],
    ) -> Result<Self, CodecError> {
        if entries.is_empty() {
            return Err(CodecError::EmptyBatch);
        }

        let logs = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let date = codec::format_timestamp(&entry.timestamp)
                    .ok_or(CodecError::UnrepresentableTimestamp { index })?;
                Ok(DocumentEntry {
                    date,
                    log: entry.message.clone(),
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(Self {
            device_id: device_id.into(),
            bundle_id: bundle_id.into(),
            doc_type: DOCUMENT_TYPE.to_string(),
            logs,
        })
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
