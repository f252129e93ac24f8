//! # Actions
//!
//! Everything that can happen in the assistant becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! A chunk arrives? That's `Action::Provisional { request, text }`.
//!
//! The `update()` function applies an action to the state and returns the
//! `Effect` the adapter must carry out. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! ## Request lifecycle
//!
//! ```text
//!          Submit                StreamOpened            EnvelopeReady
//!   Idle ──────────► Sending ──────────────► Streaming ──────────────► Idle
//!    ▲                  │                        │
//!    │                  └──── RequestFailed ─────┴──► Error ──AcknowledgeError──► Idle
//!    └──────────── Cancel (from Sending or Streaming)
//! ```
//!
//! Network actions carry the `RequestId` they belong to. Anything tagged with
//! an id other than `active_request` is stale and dropped, so a cancelled
//! request can never touch the transcript again.

use log::{debug, info, warn};

use crate::a2ui::{A2UIElement, Envelope};
use crate::core::attachment::{self, SelectedFile};
use crate::core::dispatch::{self, Dispatched, UiAction};
use crate::core::state::{App, NoticeLevel, PendingAttachment, Phase, RequestId};
use crate::inference::ChatRequest;

#[derive(Debug)]
pub enum Action {
    /// User submitted text (possibly empty when an image is attached).
    Submit(String),
    AttachFile(SelectedFile),
    /// The file could not even be read.
    AttachmentRejected(String),
    DetachFile,
    /// Response head arrived; the body is about to stream.
    StreamOpened { request: RequestId },
    /// Raw accumulated body so far.
    Provisional { request: RequestId, text: String },
    EnvelopeReady { request: RequestId, envelope: Envelope },
    RequestFailed { request: RequestId, error: String },
    Cancel,
    AcknowledgeError,
    DismissNotice,
    /// An affordance of a rendered element was activated.
    Ui(UiAction),
    Quit,
}

/// A request the adapter should send on behalf of the reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub id: RequestId,
    pub body: ChatRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SpawnRequest(OutboundRequest),
    /// Stop the task serving this request.
    AbortRequest(RequestId),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => submit(app, text),
        Action::AttachFile(file) => {
            match attachment::encode(&file, app.max_attachment_bytes) {
                Ok(image) => {
                    info!(
                        "Attached {} ({}, {} bytes)",
                        file.name,
                        image.mime_type,
                        file.bytes.len()
                    );
                    app.notify(NoticeLevel::Info, format!("Attached {}", file.name));
                    app.composer.attachment = Some(PendingAttachment {
                        name: file.name,
                        image,
                    });
                }
                Err(e) => {
                    warn!("Attachment {} rejected: {}", file.name, e);
                    app.notify(NoticeLevel::Error, format!("Attachment rejected: {e}"));
                }
            }
            Effect::None
        }
        Action::AttachmentRejected(reason) => {
            warn!("Attachment rejected: {}", reason);
            app.notify(NoticeLevel::Error, format!("Attachment rejected: {reason}"));
            Effect::None
        }
        Action::DetachFile => {
            if let Some(pending) = app.composer.attachment.take() {
                app.notify(NoticeLevel::Info, format!("Removed {}", pending.name));
            }
            Effect::None
        }
        Action::StreamOpened { request } => {
            if !app.is_current(request) || app.phase != Phase::Sending {
                debug!("Ignoring StreamOpened for stale request {}", request);
                return Effect::None;
            }
            open_reply(app);
            Effect::None
        }
        Action::Provisional { request, text } => {
            if !app.is_current(request) {
                debug!("Ignoring chunk for stale request {}", request);
                return Effect::None;
            }
            if app.phase == Phase::Sending {
                open_reply(app);
            }
            if let Err(e) = app.transcript.update_assistant_turn(&text) {
                warn!("Provisional text dropped: {}", e);
            }
            Effect::None
        }
        Action::EnvelopeReady { request, envelope } => {
            if !app.is_current(request) {
                debug!("Ignoring envelope for stale request {}", request);
                return Effect::None;
            }
            if app.phase == Phase::Sending {
                open_reply(app);
            }
            finish_reply(app, envelope)
        }
        Action::RequestFailed { request, error } => {
            if !app.is_current(request) {
                debug!("Ignoring failure of stale request {}: {}", request, error);
                return Effect::None;
            }
            fail_exchange(app, error);
            Effect::None
        }
        Action::Cancel => {
            if !app.is_loading() {
                return Effect::None;
            }
            app.transcript.abandon_exchange();
            app.phase = Phase::Idle;
            app.status_message = String::from("Reply cancelled");
            app.notify(NoticeLevel::Info, "Reply cancelled");
            match app.active_request.take() {
                Some(id) => {
                    info!("Cancelled request {}", id);
                    Effect::AbortRequest(id)
                }
                None => Effect::None,
            }
        }
        Action::AcknowledgeError => {
            if matches!(app.phase, Phase::Error(_)) {
                app.phase = Phase::Idle;
                app.notice = None;
                app.status_message = String::from("Ready");
            }
            Effect::None
        }
        Action::DismissNotice => {
            app.notice = None;
            Effect::None
        }
        Action::Ui(ui_action) => {
            match dispatch::dispatch(ui_action, app.clipboard.as_mut(), &mut app.listing) {
                Dispatched::Resubmit(text) => return submit(app, text),
                Dispatched::Copied => app.notify(NoticeLevel::Info, "Copied to clipboard"),
                Dispatched::CopyFailed(reason) => {
                    app.notify(NoticeLevel::Warning, format!("Copy failed: {reason}"))
                }
                Dispatched::AppliedOcr => app.notify(
                    NoticeLevel::Info,
                    "Extracted text applied to the listing description",
                ),
                Dispatched::AppliedAnalysis => {
                    app.notify(NoticeLevel::Info, "Analysis applied to the listing")
                }
                Dispatched::Unhandled { action } => {
                    app.notify(NoticeLevel::Warning, format!("Unsupported action: {action}"))
                }
            }
            Effect::None
        }
        Action::Quit => {
            if let Some(id) = app.active_request.take() {
                info!("Quitting with request {} in flight", id);
                app.transcript.abandon_exchange();
            }
            Effect::Quit
        }
    }
}

fn submit(app: &mut App, text: String) -> Effect {
    let text = text.trim().to_string();
    if text.is_empty() && app.composer.attachment.is_none() {
        return Effect::None;
    }

    if !app.accepts_submission() {
        warn!("Submission rejected while {}", app.phase.label());
        let message = match app.phase {
            Phase::Error(_) => "Dismiss the error (Esc) before sending again",
            _ => "Wait for the current reply to finish (Esc cancels it)",
        };
        app.notify(NoticeLevel::Warning, message);
        return Effect::None;
    }

    let image = app.composer.attachment.take().map(|pending| pending.image);
    if let Err(e) = app.transcript.append_user_turn(text, image) {
        warn!("Could not append user turn: {}", e);
        app.notify(NoticeLevel::Error, e.to_string());
        return Effect::None;
    }

    let id = app.allocate_request_id();
    let body = ChatRequest::from_transcript(&app.transcript);
    info!(
        "Submitting request {} ({} messages, image={})",
        id,
        body.messages.len(),
        body.image_url.is_some()
    );
    app.active_request = Some(id);
    app.phase = Phase::Sending;
    app.notice = None;
    app.status_message = String::from("Sending…");
    Effect::SpawnRequest(OutboundRequest { id, body })
}

fn open_reply(app: &mut App) {
    match app.transcript.begin_assistant_turn() {
        Ok(()) => {
            app.phase = Phase::Streaming;
            app.status_message = String::from("Receiving reply…");
        }
        Err(e) => warn!("Could not open assistant turn: {}", e),
    }
}

fn finish_reply(app: &mut App, envelope: Envelope) -> Effect {
    if let Some(A2UIElement::Unknown { kind }) = &envelope.ui {
        debug!("Reply carries unknown element type '{}'", kind);
    }
    match app
        .transcript
        .finalize_assistant_turn(envelope.message, envelope.ui)
    {
        Ok(turn) => {
            info!(
                "Reply finalized ({} chars, ui={:?})",
                turn.content.len(),
                turn.ui.as_ref().map(|ui| ui.kind())
            );
            app.phase = Phase::Idle;
            app.active_request = None;
            app.status_message = String::from("Ready");
        }
        Err(e) => {
            warn!("Could not finalize reply: {}", e);
            fail_exchange(app, e.to_string());
        }
    }
    Effect::None
}

fn fail_exchange(app: &mut App, error: String) {
    warn!("Exchange failed: {}", error);
    app.transcript.abandon_exchange();
    app.active_request = None;
    app.status_message = String::from("Reply failed");
    app.notify(
        NoticeLevel::Error,
        format!("The assistant could not reply: {error}"),
    );
    app.phase = Phase::Error(error);
}
