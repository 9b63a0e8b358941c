//! Document store endpoints

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::StoreClient;
use crate::error::{ClientError, Result};

/// Path, relative to the database URL, of the readiness endpoint
pub const READY_PATH: &str = "replication";

/// Body returned by the store after a successful write
#[derive(Debug, Clone, Deserialize)]
pub struct WriteAck {
    pub ok: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
}

impl StoreClient {
    /// Query the readiness endpoint
    ///
    /// Returns whatever status the store answered with; only a failure to get
    /// an answer at all is an error. Interpreting the status is left to the
    /// caller.
    pub async fn replication_status(&self) -> Result<StatusCode> {
        let url = format!("{}/{}", self.database_url, READY_PATH);
        let response = self.client.get(&url).send().await?;

        debug!("Readiness probe {} answered {}", url, response.status());
        Ok(response.status())
    }

    /// Store one serialized document
    ///
    /// Succeeds only if the store answers `201 Created` with a body whose `ok`
    /// field is `true`. Missing or malformed bodies are errors.
    pub async fn post_document(&self, body: Vec<u8>) -> Result<WriteAck> {
        let response = self
            .client
            .post(&self.database_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status != StatusCode::CREATED {
            return Err(ClientError::unexpected_status(status.as_u16(), text));
        }

        let ack: WriteAck = serde_json::from_str(&text)
            .map_err(|e| ClientError::ParseError(format!("Invalid write response: {}", e)))?;

        if !ack.ok {
            return Err(ClientError::NotAcknowledged);
        }

        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response and returns the database URL
    async fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/logs", addr)
    }

    /// Reads headers and, if announced, the full body of one request
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            data.extend_from_slice(&chunk[..n]);

            let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if data.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_replication_status_passes_status_through() {
        let url = serve_once("200 OK", "{}").await;
        let client = StoreClient::new(url);
        assert_eq!(client.replication_status().await.unwrap(), StatusCode::OK);

        let url = serve_once("503 Service Unavailable", "").await;
        let client = StoreClient::new(url);
        assert_eq!(
            client.replication_status().await.unwrap(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_post_document_accepts_created_with_ok() {
        let url = serve_once("201 Created", r#"{"ok":true,"id":"abc","rev":"1-x"}"#).await;
        let client = StoreClient::new(url);

        let ack = client.post_document(b"{}".to_vec()).await.unwrap();
        assert!(ack.ok);
        assert_eq!(ack.id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_post_document_rejects_wrong_status() {
        let url = serve_once("200 OK", r#"{"ok":true}"#).await;
        let client = StoreClient::new(url);

        let err = client.post_document(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_post_document_rejects_missing_acknowledgement() {
        let url = serve_once("201 Created", r#"{"ok":false}"#).await;
        let client = StoreClient::new(url);
        assert!(matches!(
            client.post_document(b"{}".to_vec()).await,
            Err(ClientError::NotAcknowledged)
        ));

        let url = serve_once("201 Created", "").await;
        let client = StoreClient::new(url);
        assert!(matches!(
            client.post_document(b"{}".to_vec()).await,
            Err(ClientError::ParseError(_))
        ));

        let url = serve_once("201 Created", "<html>").await;
        let client = StoreClient::new(url);
        assert!(matches!(
            client.post_document(b"{}".to_vec()).await,
            Err(ClientError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = StoreClient::new(format!("http://{}/logs", addr));
        let err = client.replication_status().await.unwrap_err();
        assert!(err.is_transport());
    }
}
