use serde::Serialize;

use crate::core::transcript::{Role, Transcript};

/// A single message in the `messages` array.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// The request body for the chat endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    /// Data URI of the newest user turn's attachment.
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatRequest {
    /// Builds the body from the full history. Only the newest turn's
    /// attachment is sent; earlier images were already seen by the backend.
    pub fn from_transcript(transcript: &Transcript) -> Self {
        let messages = transcript
            .history()
            .map(|turn| WireMessage {
                role: turn.role,
                content: turn.content.clone(),
            })
            .collect();
        let image_url = transcript
            .turns()
            .last()
            .filter(|turn| turn.role == Role::User)
            .and_then(|turn| turn.attachment.as_ref())
            .map(|image| image.data_uri());
        Self {
            messages,
            image_url,
        }
    }
}
