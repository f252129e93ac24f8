//! # ListingPanel Component
//!
//! Side panel showing the listing draft the `apply_*` actions write into.
//! Stateless; the draft is a prop.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};

use crate::core::dispatch::ListingDraft;
use crate::tui::component::Component;

/// Panels narrower than this are not drawn.
pub const MIN_PANEL_WIDTH: u16 = 24;

pub struct ListingPanel<'a> {
    pub draft: &'a ListingDraft,
    /// Name of the image waiting to be sent, if any
    pub attachment: Option<&'a str>,
}

impl<'a> ListingPanel<'a> {
    pub fn new(draft: &'a ListingDraft, attachment: Option<&'a str>) -> Self {
        Self { draft, attachment }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        if let Some(name) = self.attachment {
            lines.push(field("Attached"));
            lines.push(Line::from(name));
            lines.push(Line::default());
        }

        let analysis = self.draft.analysis.as_ref();

        if let Some(title) = analysis.map(|a| a.suggested_title.as_str()).filter(|t| !t.is_empty()) {
            lines.push(field("Title"));
            lines.push(Line::from(title));
            lines.push(Line::default());
        }

        if let Some(text) = self.draft.extracted_text.as_deref() {
            lines.push(field("Description (from photo text)"));
            lines.extend(text.lines().map(Line::from));
            lines.push(Line::default());
        }

        if let Some(analysis) = analysis {
            if !analysis.description.is_empty() {
                lines.push(field("Description"));
                lines.extend(analysis.description.lines().map(Line::from));
                lines.push(Line::default());
            }
            if !analysis.features.is_empty() {
                lines.push(field("Features"));
                lines.extend(analysis.features.iter().map(|f| Line::from(format!("• {f}"))));
                lines.push(Line::default());
            }
            if !analysis.tags.is_empty() {
                lines.push(field("Tags"));
                lines.push(Line::from(analysis.tags.join(", ")));
                lines.push(Line::default());
            }
            if !analysis.alt_text.is_empty() {
                lines.push(field("Alt text"));
                lines.push(Line::from(analysis.alt_text.as_str()));
            }
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Nothing applied yet",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

fn field(name: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        name,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

impl<'a> Component for ListingPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if area.width < MIN_PANEL_WIDTH {
            return;
        }
        let block = Block::bordered()
            .title("listing draft")
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM))
            .padding(Padding::horizontal(1));
        let paragraph = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}
