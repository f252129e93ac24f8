//! # TitleBar Component
//!
//! Top status bar: endpoint, request phase, status text and the latest
//! notification.
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state.
//!
//! ```text
//! Storefront Assistant (localhost) | streaming | Receiving reply… | ↓ New
//! Storefront Assistant (localhost) | error | Reply failed | ✖ The assistant could not reply: …
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::state::{NoticeLevel, Notification};
use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub backend_name: &'a str,
    pub phase_label: &'a str,
    pub status_message: &'a str,
    pub notice: Option<&'a Notification>,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    pub fn new(
        backend_name: &'a str,
        phase_label: &'a str,
        status_message: &'a str,
        notice: Option<&'a Notification>,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            backend_name,
            phase_label,
            status_message,
            notice,
            has_unseen_content,
        }
    }

    fn line(&self) -> Line<'a> {
        let mut spans = vec![
            Span::styled(
                format!("Storefront Assistant ({})", self.backend_name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            Span::styled(self.phase_label, phase_style(self.phase_label)),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::raw(self.status_message));
        }
        if self.has_unseen_content {
            spans.push(Span::raw(" | ↓ New"));
        }
        if let Some(notice) = self.notice {
            let (icon, color) = match notice.level {
                NoticeLevel::Info => ("ℹ", Color::Cyan),
                NoticeLevel::Warning => ("⚠", Color::Yellow),
                NoticeLevel::Error => ("✖", Color::Red),
            };
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("{icon} {}", notice.text),
                Style::default().fg(color),
            ));
        }
        Line::from(spans)
    }
}

fn phase_style(label: &str) -> Style {
    match label {
        "error" => Style::default().fg(Color::Red),
        "sending" | "streaming" => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Green),
    }
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}
