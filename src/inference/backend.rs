use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use super::types::ChatRequest;

/// Errors that can occur while talking to the chat endpoint.
/// None of them are retried automatically; the user resubmits.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Endpoint misconfigured (bad URL, client build failure).
    #[error("config error: {0}")]
    Config(String),
    /// Network-level failure (timeout, DNS, connection reset mid-stream).
    #[error("network error: {0}")]
    Network(String),
    /// The endpoint answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

/// Text chunks of one response body, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<String, BackendError>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    /// Sends the request and resolves once the response head has arrived.
    /// The returned stream yields the body as it is produced.
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError>;
}
