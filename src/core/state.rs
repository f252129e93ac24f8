//! # Application State
//!
//! Core business state for the assistant. This module contains domain logic
//! only, no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn ChatBackend>      // chat endpoint
//! ├── transcript: Transcript             // turns of this session
//! ├── phase: Phase                       // Idle / Sending / Streaming / Error
//! ├── composer: Composer                 // attachment waiting for the next submission
//! ├── listing: ListingDraft              // fields written by apply_* actions
//! ├── clipboard: Box<dyn Clipboard>      // copy target
//! ├── notice: Option<Notification>       // latest user-visible notice
//! ├── status_message: String             // status bar text
//! ├── max_attachment_bytes: u64
//! ├── malformed_policy: MalformedEnvelope
//! └── active_request: Option<RequestId>  // the only request whose actions count
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::attachment::{DEFAULT_MAX_ATTACHMENT_BYTES, EncodedImage};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::{Clipboard, ListingDraft};
use crate::core::transcript::Transcript;
use crate::inference::{ChatBackend, MalformedEnvelope};

/// Identifies one outbound request. Actions carrying another id are stale.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Request sent, response head not yet received.
    Sending,
    Streaming,
    /// The last exchange failed. Cleared by acknowledgement.
    Error(String),
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "ready",
            Phase::Sending => "sending",
            Phase::Streaming => "streaming",
            Phase::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub text: String,
}

/// An encoded image waiting for the next submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub name: String,
    pub image: EncodedImage,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Composer {
    pub attachment: Option<PendingAttachment>,
}

pub struct App {
    pub backend: Arc<dyn ChatBackend>,
    pub transcript: Transcript,
    pub phase: Phase,
    pub composer: Composer,
    pub listing: ListingDraft,
    pub clipboard: Box<dyn Clipboard>,
    pub notice: Option<Notification>,
    pub status_message: String,
    pub max_attachment_bytes: u64,
    pub malformed_policy: MalformedEnvelope,
    pub active_request: Option<RequestId>,
    next_request_id: RequestId,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
            phase: Phase::Idle,
            composer: Composer::default(),
            listing: ListingDraft::default(),
            clipboard,
            notice: None,
            status_message: String::from("Ask about a listing, or /attach a photo"),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            malformed_policy: MalformedEnvelope::default(),
            active_request: None,
            next_request_id: 1,
        }
    }

    pub fn from_config(
        backend: Arc<dyn ChatBackend>,
        clipboard: Box<dyn Clipboard>,
        config: &ResolvedConfig,
    ) -> Self {
        let mut app = Self::new(backend, clipboard);
        app.max_attachment_bytes = config.max_attachment_bytes;
        app.malformed_policy = config.malformed_envelope;
        app
    }

    /// True while a request is in flight (Sending or Streaming).
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Sending | Phase::Streaming)
    }

    /// False while a reply is pending or an error is shown.
    pub fn accepts_submission(&self) -> bool {
        self.phase == Phase::Idle && !self.transcript.in_flight()
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notification {
            level,
            text: text.into(),
        });
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// True if `request` is the one currently in flight.
    pub(crate) fn is_current(&self, request: RequestId) -> bool {
        self.active_request == Some(request)
    }
}
