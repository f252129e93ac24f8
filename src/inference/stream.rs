//! # Stream Ingestor
//!
//! The endpoint streams ONE JSON document across many chunks (not NDJSON,
//! not SSE). Chunks are appended to a buffer and the buffer is decoded as an
//! [`Envelope`] once it is structurally complete.
//!
//! ```text
//! chunk ──► buffer += chunk ──► JsonScanner.feed(chunk)
//!                                  │
//!              Incomplete ─────────┼──► Partial(buffer)
//!              Invalid ────────────┼──► Partial(buffer), stop decoding
//!              Complete ───────────┴──► serde_json ──► Complete(envelope), then silence
//! ```
//!
//! The scanner only sees each byte once, so a long reply costs O(n) rather
//! than re-parsing the whole buffer on every chunk.

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::backend::BackendError;
use crate::a2ui::Envelope;

/// What to do with a stream that ends without a decodable envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedEnvelope {
    /// The exchange fails.
    #[default]
    Fail,
    /// The raw text becomes the reply, with no element.
    PlainText,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    /// Raw accumulated text so far.
    Partial(String),
    /// Emitted at most once per stream.
    Complete(Envelope),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("the response was empty")]
    Empty,
    #[error("the response ended before the reply was complete ({received} bytes received)")]
    Truncated { received: usize },
    #[error("the reply could not be read: {reason}")]
    Malformed { reason: String },
}

/// Terminal failure of [`ingest`].
#[derive(Debug, Error)]
pub enum StreamFailure {
    #[error(transparent)]
    Transport(#[from] BackendError),
    #[error(transparent)]
    Decode(#[from] IngestError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Incomplete,
    Complete,
    Invalid,
}

/// Incremental structural scanner for a single top-level JSON object.
///
/// Tracks string/escape state and bracket nesting only; token contents are
/// left to `serde_json` once the object closes. Anything that can never
/// become a valid object (wrong opener, mismatched closer, stray bytes) is
/// reported as `Invalid` as soon as it is seen.
#[derive(Debug, Default)]
pub struct JsonScanner {
    stack: Vec<char>,
    started: bool,
    closed: bool,
    in_string: bool,
    escaped: bool,
    invalid: Option<String>,
    consumed: usize,
}

impl JsonScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ScanStatus {
        if self.invalid.is_some() {
            ScanStatus::Invalid
        } else if self.closed {
            ScanStatus::Complete
        } else {
            ScanStatus::Incomplete
        }
    }

    /// Why the input was rejected, if it was.
    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid.as_deref()
    }

    pub fn feed(&mut self, text: &str) -> ScanStatus {
        for c in text.chars() {
            if self.invalid.is_some() {
                break;
            }
            self.step(c);
            self.consumed += c.len_utf8();
        }
        self.status()
    }

    fn reject(&mut self, what: &str, c: char) {
        self.invalid = Some(format!("{} {:?} at byte {}", what, c, self.consumed));
    }

    fn step(&mut self, c: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            } else if (c as u32) < 0x20 {
                self.reject("raw control character", c);
            }
            return;
        }

        if c.is_whitespace() || c == '\u{feff}' {
            return;
        }
        if self.closed {
            self.reject("trailing data", c);
            return;
        }
        if !self.started {
            if c == '{' {
                self.started = true;
                self.stack.push('{');
            } else {
                self.reject("expected '{' but found", c);
            }
            return;
        }

        match c {
            '"' => self.in_string = true,
            '{' | '[' => self.stack.push(c),
            '}' | ']' => {
                let opener = if c == '}' { '{' } else { '[' };
                if self.stack.pop() != Some(opener) {
                    self.reject("mismatched", c);
                } else if self.stack.is_empty() {
                    self.closed = true;
                }
            }
            ',' | ':' => {}
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.') => {}
            other => self.reject("unexpected", other),
        }
    }
}

#[derive(Debug)]
enum IngestState {
    Scanning,
    Decoded,
    Invalid(String),
}

/// Accumulates chunks and decodes the envelope exactly once.
#[derive(Debug)]
pub struct StreamIngestor {
    buffer: String,
    scanner: JsonScanner,
    state: IngestState,
    policy: MalformedEnvelope,
    chunk_count: usize,
}

impl StreamIngestor {
    pub fn new(policy: MalformedEnvelope) -> Self {
        Self {
            buffer: String::new(),
            scanner: JsonScanner::new(),
            state: IngestState::Scanning,
            policy,
            chunk_count: 0,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self.state, IngestState::Decoded)
    }

    /// Feeds one chunk. Returns `None` for empty chunks and for everything
    /// after the envelope has been decoded.
    pub fn push(&mut self, chunk: &str) -> Option<IngestEvent> {
        if chunk.is_empty() {
            return None;
        }
        if self.is_decoded() {
            debug!("Ignoring {} bytes after the envelope was decoded", chunk.len());
            return None;
        }

        self.chunk_count += 1;
        self.buffer.push_str(chunk);

        if matches!(self.state, IngestState::Scanning) {
            match self.scanner.feed(chunk) {
                ScanStatus::Incomplete => {}
                ScanStatus::Complete => match serde_json::from_str::<Envelope>(&self.buffer) {
                    Ok(envelope) => {
                        info!(
                            "Envelope decoded after {} chunks ({} bytes), ui={:?}",
                            self.chunk_count,
                            self.buffer.len(),
                            envelope.ui.as_ref().map(|ui| ui.kind())
                        );
                        self.state = IngestState::Decoded;
                        return Some(IngestEvent::Complete(envelope));
                    }
                    Err(e) => {
                        warn!("Complete JSON is not an envelope: {}", e);
                        self.state = IngestState::Invalid(e.to_string());
                    }
                },
                ScanStatus::Invalid => {
                    let reason = self
                        .scanner
                        .invalid_reason()
                        .unwrap_or("invalid JSON")
                        .to_string();
                    warn!("Response is not a JSON envelope: {}", reason);
                    self.state = IngestState::Invalid(reason);
                }
            }
        }

        Some(IngestEvent::Partial(self.buffer.clone()))
    }

    /// Ends the stream. `Ok(None)` means the envelope was already emitted;
    /// `Ok(Some(_))` is the plain-text fallback.
    pub fn finish(self) -> Result<Option<Envelope>, IngestError> {
        let failure = match self.state {
            IngestState::Decoded => return Ok(None),
            _ if self.buffer.trim().is_empty() => IngestError::Empty,
            IngestState::Invalid(reason) => IngestError::Malformed { reason },
            IngestState::Scanning => IngestError::Truncated {
                received: self.buffer.len(),
            },
        };

        match self.policy {
            MalformedEnvelope::Fail => Err(failure),
            MalformedEnvelope::PlainText if failure == IngestError::Empty => Err(failure),
            MalformedEnvelope::PlainText => {
                info!("Falling back to plain text after: {}", failure);
                Ok(Some(Envelope {
                    message: self.buffer.trim().to_string(),
                    ui: None,
                }))
            }
        }
    }
}

/// Drives a chunk stream through a [`StreamIngestor`], reporting each event.
///
/// Stops reading as soon as the envelope is decoded. A plain-text fallback is
/// reported as a final `Complete` event.
pub async fn ingest<S, F>(
    mut chunks: S,
    policy: MalformedEnvelope,
    mut on_event: F,
) -> Result<(), StreamFailure>
where
    S: Stream<Item = Result<String, BackendError>> + Unpin,
    F: FnMut(IngestEvent),
{
    let mut ingestor = StreamIngestor::new(policy);

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        debug!("Chunk received: {} bytes", chunk.len());
        if let Some(event) = ingestor.push(&chunk) {
            let done = matches!(event, IngestEvent::Complete(_));
            on_event(event);
            if done {
                return Ok(());
            }
        }
    }

    if let Some(envelope) = ingestor.finish()? {
        on_event(IngestEvent::Complete(envelope));
    }
    Ok(())
}
