//! Logship HTTP Client
//!
//! A small, typed HTTP client for the document store that receives shipped
//! log documents.
//!
//! The store is addressed by a single database URL. Two endpoints are used:
//! - `GET {database_url}/replication` reports whether the store accepts writes
//! - `POST {database_url}` stores one JSON document
//!
//! # Example
//!
//! ```no_run
//! use logship_client::StoreClient;
//!
//! #[tokio::main]
//! async fn main() -> logship_client::Result<()> {
//!     let client = StoreClient::new("http://localhost:5984/logs");
//!
//!     if client.replication_status().await?.is_success() {
//!         let ack = client.post_document(br#"{"type":"client-logs"}"#.to_vec()).await?;
//!         println!("Stored document {:?}", ack.id);
//!     }
//!     Ok(())
//! }
//! ```

mod documents;
pub mod error;

pub use documents::{READY_PATH, WriteAck};
pub use error::{ClientError, Result};

use reqwest::Client;

/// HTTP client for the document store
#[derive(Debug, Clone)]
pub struct StoreClient {
    /// Database URL (e.g., "http://localhost:5984/logs")
    database_url: String,
    /// HTTP client instance
    client: Client,
}

impl StoreClient {
    /// Create a new store client
    ///
    /// # Arguments
    /// * `database_url` - URL of the database documents are posted to
    pub fn new(database_url: impl Into<String>) -> Self {
        Self::with_client(database_url, Client::new())
    }

    /// Create a new store client with a custom HTTP client
    ///
    /// This is how request timeouts are configured: the store client itself
    /// never waits longer than the underlying reqwest client allows.
    ///
    /// # Example
    /// ```
    /// use logship_client::StoreClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = StoreClient::with_client("http://localhost:5984/logs", http_client);
    /// ```
    pub fn with_client(database_url: impl Into<String>, client: Client) -> Self {
        let database_url = database_url.into();
        Self {
            database_url: database_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StoreClient::new("http://localhost:5984/logs");
        assert_eq!(client.database_url(), "http://localhost:5984/logs");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = StoreClient::new("http://localhost:5984/logs/");
        assert_eq!(client.database_url(), "http://localhost:5984/logs");
    }
}
