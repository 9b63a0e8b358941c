//! Remote repository
//!
//! Talks to the document store through [`StoreClient`]. This is a stateless
//! adapter: it turns HTTP answers into "ready or not" and "stored or not",
//! and leaves retries and fallbacks to the service layer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use logship_client::StoreClient;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Repository trait for the remote document store
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Asks the store whether it currently accepts writes
    ///
    /// A reachable store that is not ready, an unreachable store and a timed
    /// out request all yield `false`; none of them is an error.
    async fn probe_ready(&self) -> bool;

    /// Stores one serialized log document
    ///
    /// Resolves exactly once; any error means the document was not stored.
    async fn write(&self, document: Vec<u8>) -> Result<()>;
}

/// HTTP implementation of RemoteRepository
pub struct HttpRemoteRepository {
    client: StoreClient,
}

impl HttpRemoteRepository {
    /// Creates a new HTTP remote repository
    ///
    /// # Arguments
    /// * `database_url` - URL of the database documents are posted to
    /// * `timeout` - Upper bound on every request, probes included
    pub fn new(database_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(StoreClient::with_client(database_url, http)))
    }

    pub fn with_client(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteRepository for HttpRemoteRepository {
    async fn probe_ready(&self) -> bool {
        match self.client.replication_status().await {
            Ok(status) => status == StatusCode::OK,
            Err(e) if e.is_transport() => {
                debug!("Remote store unreachable: {}", e);
                false
            }
            Err(e) => {
                debug!("Readiness probe failed: {}", e);
                false
            }
        }
    }

    async fn write(&self, document: Vec<u8>) -> Result<()> {
        let size = document.len();

        let ack = self
            .client
            .post_document(document)
            .await
            .context("Failed to store log document")?;

        debug!(
            "Stored {} byte log document as {}",
            size,
            ack.id.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }
}
