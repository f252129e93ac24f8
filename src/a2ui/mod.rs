//! # A2UI Element Schema
//!
//! The backend answers every turn with one JSON envelope:
//!
//! ```text
//! { "message": "Here is what I found", "ui": { "type": "ocr_result", "props": { "text": "..." } } }
//! ```
//!
//! `ui` is optional and, when present, is one element from a closed set of
//! variants. The payload comes from model output, so decoding never fails on
//! an unfamiliar element: anything that does not match a known variant becomes
//! [`A2UIElement::Unknown`] and renders as nothing.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The decoded form of a complete streamed response.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: String,
    /// `null` and a missing key both mean "no element".
    #[serde(default, deserialize_with = "lenient_element")]
    pub ui: Option<A2UIElement>,
}

/// Decodes `ui` without ever failing the envelope: a value that is not an
/// element object at all still yields `Unknown`.
fn lenient_element<'de, D>(deserializer: D) -> Result<Option<A2UIElement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|value| {
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Discarding unreadable element: {}", e);
            A2UIElement::Unknown {
                kind: String::new(),
            }
        })
    }))
}

/// One server-declared UI element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "RawElement")]
pub enum A2UIElement {
    Text(TextProps),
    Heading(HeadingProps),
    OcrResult(OcrResultProps),
    ImageAnalysis(AnalysisResult),
    SuggestionChips(SuggestionChipsProps),
    Card(CardProps),
    /// A `type` outside the closed set, or a known `type` with unusable props.
    Unknown { kind: String },
}

impl A2UIElement {
    /// The wire name of this element's `type`.
    pub fn kind(&self) -> &str {
        match self {
            A2UIElement::Text(_) => "text",
            A2UIElement::Heading(_) => "heading",
            A2UIElement::OcrResult(_) => "ocr_result",
            A2UIElement::ImageAnalysis(_) => "image_analysis",
            A2UIElement::SuggestionChips(_) => "suggestion_chips",
            A2UIElement::Card(_) => "card",
            A2UIElement::Unknown { kind } => kind,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextProps {
    #[serde(alias = "text", alias = "value")]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HeadingProps {
    #[serde(alias = "text", alias = "value")]
    pub content: String,
    #[serde(default)]
    pub level: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OcrResultProps {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuggestionChipsProps {
    pub chips: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CardProps {
    pub title: String,
    #[serde(alias = "body")]
    pub content: String,
}

/// Structured image analysis. This is both the `image_analysis` element's
/// props and the value written to the listing editor on "apply analysis".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub suggested_title: String,
}

/// Untyped shape every element shares on the wire.
#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    props: serde_json::Value,
}

fn props<T: DeserializeOwned>(kind: &str, value: serde_json::Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(props) => Some(props),
        Err(e) => {
            warn!("Discarding '{}' element with malformed props: {}", kind, e);
            None
        }
    }
}

impl From<RawElement> for A2UIElement {
    fn from(raw: RawElement) -> Self {
        let RawElement { kind, props: value } = raw;
        let decoded = match kind.as_str() {
            "text" => props(&kind, value).map(A2UIElement::Text),
            "heading" => props(&kind, value).map(A2UIElement::Heading),
            "ocr_result" => props(&kind, value).map(A2UIElement::OcrResult),
            "image_analysis" => props(&kind, value).map(A2UIElement::ImageAnalysis),
            "suggestion_chips" => props(&kind, value).map(A2UIElement::SuggestionChips),
            "card" => props(&kind, value).map(A2UIElement::Card),
            other => {
                warn!("Unrecognized element type '{}'", other);
                None
            }
        };
        decoded.unwrap_or(A2UIElement::Unknown { kind })
    }
}
