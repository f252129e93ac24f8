//! # Action Dispatcher
//!
//! Rendered elements emit a [`UiAction`] when the user activates one of their
//! affordances. The dispatcher routes it to exactly one place:
//!
//! ```text
//! input          → new submission (returned as Dispatched::Resubmit)
//! copy           → Clipboard
//! apply_ocr      → ListingSink::set_extracted_text
//! apply_analysis → ListingSink::set_analysis
//! anything else  → Dispatched::Unhandled (logged)
//! ```
//!
//! The dispatcher never touches the transcript. Resubmission is handed back to
//! the orchestrator so the "one request in flight" rule still applies.

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::a2ui::AnalysisResult;

/// The closed set of action identifiers elements may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Input,
    Copy,
    ApplyOcr,
    ApplyAnalysis,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Input,
        ActionKind::Copy,
        ActionKind::ApplyOcr,
        ActionKind::ApplyAnalysis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Input => "input",
            ActionKind::Copy => "copy",
            ActionKind::ApplyOcr => "apply_ocr",
            ActionKind::ApplyAnalysis => "apply_analysis",
        }
    }

    pub fn parse(name: &str) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// An action with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Input(String),
    Copy(String),
    ApplyOcr(String),
    ApplyAnalysis(AnalysisResult),
    /// Identifier outside [`ActionKind`], or a known one whose payload did not fit.
    Unrecognized { name: String, payload: Value },
}

impl UiAction {
    /// Builds an action from an untyped `(identifier, payload)` pair.
    pub fn from_raw(name: &str, payload: Value) -> UiAction {
        let typed = match ActionKind::parse(name) {
            Some(ActionKind::Input) => payload.as_str().map(|s| UiAction::Input(s.to_string())),
            Some(ActionKind::Copy) => payload.as_str().map(|s| UiAction::Copy(s.to_string())),
            Some(ActionKind::ApplyOcr) => {
                payload.as_str().map(|s| UiAction::ApplyOcr(s.to_string()))
            }
            Some(ActionKind::ApplyAnalysis) => serde_json::from_value(payload.clone())
                .ok()
                .map(UiAction::ApplyAnalysis),
            None => None,
        };
        typed.unwrap_or_else(|| UiAction::Unrecognized {
            name: name.to_string(),
            payload,
        })
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            UiAction::Input(_) => Some(ActionKind::Input),
            UiAction::Copy(_) => Some(ActionKind::Copy),
            UiAction::ApplyOcr(_) => Some(ActionKind::ApplyOcr),
            UiAction::ApplyAnalysis(_) => Some(ActionKind::ApplyAnalysis),
            UiAction::Unrecognized { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Write-only text clipboard. Best effort.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Setters owned by the listing editor.
pub trait ListingSink {
    fn set_extracted_text(&mut self, text: String);
    fn set_analysis(&mut self, analysis: AnalysisResult);
}

/// In-process listing editor state fed by `apply_ocr` / `apply_analysis`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListingDraft {
    pub extracted_text: Option<String>,
    pub analysis: Option<AnalysisResult>,
}

impl ListingSink for ListingDraft {
    fn set_extracted_text(&mut self, text: String) {
        self.extracted_text = Some(text);
    }

    fn set_analysis(&mut self, analysis: AnalysisResult) {
        self.analysis = Some(analysis);
    }
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Submit this text as if the user had typed it.
    Resubmit(String),
    Copied,
    CopyFailed(String),
    AppliedOcr,
    AppliedAnalysis,
    Unhandled { action: String },
}

pub fn dispatch(
    action: UiAction,
    clipboard: &mut dyn Clipboard,
    listing: &mut dyn ListingSink,
) -> Dispatched {
    debug!("Dispatching action {:?}", action.kind().map(ActionKind::as_str));
    match action {
        UiAction::Input(text) => Dispatched::Resubmit(text),
        UiAction::Copy(text) => match clipboard.write_text(&text) {
            Ok(()) => Dispatched::Copied,
            Err(e) => {
                warn!("Copy failed: {}", e);
                Dispatched::CopyFailed(e.to_string())
            }
        },
        UiAction::ApplyOcr(text) => {
            listing.set_extracted_text(text);
            Dispatched::AppliedOcr
        }
        UiAction::ApplyAnalysis(analysis) => {
            listing.set_analysis(analysis);
            Dispatched::AppliedAnalysis
        }
        UiAction::Unrecognized { name, payload } => {
            warn!("Unhandled action '{}' (payload: {})", name, payload);
            Dispatched::Unhandled { action: name }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingClipboard;
    use serde_json::json;

    fn analysis(desc: &str) -> AnalysisResult {
        AnalysisResult {
            description: desc.to_string(),
            features: vec!["solid oak".to_string()],
            tags: vec!["a".to_string(), "b".to_string()],
            alt_text: "chair".to_string(),
            suggested_title: "Oak Chair".to_string(),
        }
    }

    #[test]
    fn test_action_kind_round_trips_names() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("delete_listing"), None);
    }

    #[test]
    fn test_input_resubmits() {
        let mut clipboard = RecordingClipboard::default();
        let mut listing = ListingDraft::default();
        let out = dispatch(
            UiAction::Input("Write a title".to_string()),
            &mut clipboard,
            &mut listing,
        );
        assert_eq!(out, Dispatched::Resubmit("Write a title".to_string()));
        assert_eq!(listing, ListingDraft::default());
    }

    #[test]
    fn test_copy_writes_clipboard_only() {
        let mut clipboard = RecordingClipboard::default();
        let mut listing = ListingDraft::default();
        let out = dispatch(UiAction::Copy("SKU-42".to_string()), &mut clipboard, &mut listing);
        assert_eq!(out, Dispatched::Copied);
        assert_eq!(clipboard.written(), vec!["SKU-42".to_string()]);
        assert_eq!(listing, ListingDraft::default());
    }

    #[test]
    fn test_copy_failure_is_reported() {
        let mut clipboard = RecordingClipboard::failing();
        let mut listing = ListingDraft::default();
        let out = dispatch(UiAction::Copy("x".to_string()), &mut clipboard, &mut listing);
        assert!(matches!(out, Dispatched::CopyFailed(_)));
    }

    #[test]
    fn test_apply_ocr_last_write_wins() {
        let mut clipboard = RecordingClipboard::default();
        let mut listing = ListingDraft::default();
        dispatch(UiAction::ApplyOcr("A".to_string()), &mut clipboard, &mut listing);
        dispatch(UiAction::ApplyOcr("B".to_string()), &mut clipboard, &mut listing);
        assert_eq!(listing.extracted_text.as_deref(), Some("B"));
    }

    #[test]
    fn test_apply_analysis_last_write_wins() {
        let mut clipboard = RecordingClipboard::default();
        let mut listing = ListingDraft::default();
        dispatch(UiAction::ApplyAnalysis(analysis("first")), &mut clipboard, &mut listing);
        let out = dispatch(UiAction::ApplyAnalysis(analysis("second")), &mut clipboard, &mut listing);
        assert_eq!(out, Dispatched::AppliedAnalysis);
        assert_eq!(listing.analysis, Some(analysis("second")));
        assert!(listing.extracted_text.is_none());
    }

    #[test]
    fn test_unknown_action_is_unhandled() {
        let mut clipboard = RecordingClipboard::default();
        let mut listing = ListingDraft::default();
        let action = UiAction::from_raw("share", json!("https://example.com"));
        let out = dispatch(action, &mut clipboard, &mut listing);
        assert_eq!(
            out,
            Dispatched::Unhandled {
                action: "share".to_string()
            }
        );
        assert!(clipboard.written().is_empty());
    }

    #[test]
    fn test_from_raw_types_payloads() {
        assert_eq!(
            UiAction::from_raw("copy", json!("text")),
            UiAction::Copy("text".to_string())
        );
        let payload = json!({
            "description": "first",
            "features": ["solid oak"],
            "tags": ["a", "b"],
            "altText": "chair",
            "suggestedTitle": "Oak Chair"
        });
        assert_eq!(
            UiAction::from_raw("apply_analysis", payload),
            UiAction::ApplyAnalysis(analysis("first"))
        );
    }

    #[test]
    fn test_from_raw_bad_payload_is_unrecognized() {
        let action = UiAction::from_raw("apply_ocr", json!({"text": 1}));
        assert!(matches!(action, UiAction::Unrecognized { ref name, .. } if name == "apply_ocr"));
        assert_eq!(action.kind(), None);
    }
}
