//! HTTP backend for the storefront chat endpoint.
//!
//! One POST per exchange. The response body is a single JSON envelope
//! streamed as raw text, so the body is forwarded chunk by chunk without any
//! framing. Bytes are decoded as UTF-8 with multi-byte sequences carried
//! across network chunk boundaries.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};

use super::backend::{BackendError, ChatBackend, ChunkStream};
use super::types::ChatRequest;

pub struct HttpBackend {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend posting to `url`.
    ///
    /// Only the connection phase is bounded by `connect_timeout`; a streaming
    /// reply may take as long as it needs.
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, BackendError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| BackendError::Config(format!("invalid endpoint URL '{url}': {e}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        self.url.host_str().unwrap_or("chat endpoint")
    }

    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
        let json_body = serde_json::to_string(request)
            .map_err(|e| BackendError::Config(format!("Request serialization failed: {e}")))?;
        info!(
            "Chat request: messages={}, image={}, body={} bytes",
            request.messages.len(),
            request.image_url.is_some(),
            json_body.len()
        );

        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Chat endpoint response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chat endpoint error: {} - {}", status, err_body);
            return Err(BackendError::Api {
                status,
                message: err_body,
            });
        }

        let body = response.bytes_stream().boxed();
        let chunks = futures::stream::unfold(
            (body, Utf8Carry::default(), false),
            |(mut body, mut carry, done)| async move {
                if done {
                    return None;
                }
                loop {
                    match body.next().await {
                        Some(Ok(bytes)) => {
                            let text = carry.push(&bytes);
                            if !text.is_empty() {
                                return Some((Ok(text), (body, carry, false)));
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Response body failed mid-stream: {}", e);
                            let err = BackendError::Network(e.to_string());
                            return Some((Err(err), (body, carry, true)));
                        }
                        None => {
                            let tail = carry.flush();
                            if tail.is_empty() {
                                return None;
                            }
                            return Some((Ok(tail), (body, carry, true)));
                        }
                    }
                }
            },
        );
        Ok(chunks.boxed())
    }
}

/// Incremental UTF-8 decoder. An incomplete trailing sequence is held back
/// until the next chunk; invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Whatever is still held back, decoded lossily.
    pub(crate) fn flush(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}
