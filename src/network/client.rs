//! Network client
//!
//! The `NetworkClient` trait is the only way the signing workflow talks to
//! the outside world. `RpcClient` implements it over the node's JSON-RPC
//! endpoint.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use super::message::{
    RpcRequest, RpcResponse, METHOD_GET_BLOCK_COUNT, METHOD_SEND_RAW_TRANSACTION,
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often `wait_for_blocks` polls the chain height
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Network-related errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transaction rejected ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {0:?} waiting for new blocks")]
    Timeout(Duration),
}

/// Submission and chain-height access for a node
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Submit a hex-encoded transaction, returning its id
    async fn submit(&self, encoded: &str) -> Result<String, NetworkError>;

    /// Height of the latest block
    async fn current_height(&self) -> Result<u32, NetworkError>;

    /// Wait until `count` blocks past the current height exist
    async fn wait_for_blocks(&self, count: u32, timeout: Duration) -> Result<u32, NetworkError> {
        let target = self.current_height().await?.saturating_add(count);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let height = self.current_height().await?;
            if height >= target {
                return Ok(height);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(NetworkError::Timeout(timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// JSON-RPC client for a node
pub struct RpcClient {
    url: String,
    http_client: HttpClient,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for the node at `url`
    pub fn new(url: &str) -> Result<Self, NetworkError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make an RPC request
    async fn rpc_request<T>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, NetworkError>
    where
        T: serde::de::DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);
        log::debug!("RPC {} -> {} (id {})", method, self.url, id);

        let response: RpcResponse = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::debug!("RPC {} <- error {} ({})", method, response.error, response.desc);
        response.into_result()
    }
}

#[async_trait]
impl NetworkClient for RpcClient {
    async fn submit(&self, encoded: &str) -> Result<String, NetworkError> {
        self.rpc_request(METHOD_SEND_RAW_TRANSACTION, serde_json::json!([encoded]))
            .await
    }

    async fn current_height(&self) -> Result<u32, NetworkError> {
        let count: u32 = self
            .rpc_request(METHOD_GET_BLOCK_COUNT, serde_json::json!([]))
            .await?;
        Ok(count.saturating_sub(1))
    }
}
