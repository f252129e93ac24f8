//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use crate::core::dispatch::{Clipboard, ClipboardError};
use crate::core::state::App;
use crate::inference::{BackendError, ChatBackend, ChatRequest, ChunkStream};

/// One canned reply: either the request fails outright, or it streams these items.
pub enum Script {
    Refuse(BackendError),
    Stream(Vec<Result<String, BackendError>>),
}

/// A backend that replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A backend that streams `chunks` once.
    pub fn streaming(chunks: &[&str]) -> Self {
        Self::new(vec![Script::Stream(
            chunks.iter().map(|c| Ok(c.to_string())).collect(),
        )])
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.scripts.lock().unwrap().pop_front() {
            Some(Script::Refuse(err)) => Err(err),
            Some(Script::Stream(items)) => Ok(futures::stream::iter(items).boxed()),
            None => Err(BackendError::Network("no scripted reply left".to_string())),
        }
    }
}

/// Clipboard that records writes. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingClipboard {
    written: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError("no terminal attached".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Creates a test App with an empty ScriptedBackend.
pub fn test_app() -> App {
    test_app_with_clipboard(RecordingClipboard::default())
}

pub fn test_app_with_clipboard(clipboard: RecordingClipboard) -> App {
    App::new(Arc::new(ScriptedBackend::default()), Box::new(clipboard))
}
