//! # Element Renderer
//!
//! Maps one [`A2UIElement`] to terminal lines plus its interactive
//! affordances. Rendering is pure: the same element always yields the same
//! output, and nothing here mutates state. Activating an affordance hands its
//! [`UiAction`] to the caller, which routes it through the dispatcher.
//!
//! | element            | shows                                   | affordances                          |
//! |--------------------|-----------------------------------------|--------------------------------------|
//! | `text`             | the text                                | none                                 |
//! | `heading`          | the text, bold                          | none                                 |
//! | `ocr_result`       | extracted text                          | copy, apply to description           |
//! | `image_analysis`   | title, description, features, tag badges| apply analysis                       |
//! | `suggestion_chips` | nothing                                 | one per chip (submits the chip text) |
//! | `card`             | title and body                          | none                                 |
//! | unknown            | nothing                                 | none                                 |

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::a2ui::A2UIElement;
use crate::core::dispatch::UiAction;

/// An activatable control attached to a rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct Affordance {
    pub label: String,
    pub action: UiAction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementRender {
    pub lines: Vec<Line<'static>>,
    /// Non-interactive labels (analysis tags).
    pub badges: Vec<String>,
    pub affordances: Vec<Affordance>,
}

impl ElementRender {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.badges.is_empty() && self.affordances.is_empty()
    }

    /// Hands the action of affordance `index` to `on_action`. Returns false if
    /// there is no such affordance.
    pub fn activate(&self, index: usize, on_action: impl FnOnce(UiAction)) -> bool {
        match self.affordances.get(index) {
            Some(affordance) => {
                on_action(affordance.action.clone());
                true
            }
            None => false,
        }
    }

    /// All lines to draw, with the `focused` affordance highlighted.
    pub fn to_lines(&self, focused: Option<usize>) -> Vec<Line<'static>> {
        let mut lines = self.lines.clone();

        if !self.badges.is_empty() {
            let mut spans = Vec::with_capacity(self.badges.len() * 2);
            for (i, badge) in self.badges.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                spans.push(Span::styled(
                    format!("#{badge}"),
                    Style::default().fg(Color::Magenta),
                ));
            }
            lines.push(Line::from(spans));
        }

        if !self.affordances.is_empty() {
            let mut spans = Vec::with_capacity(self.affordances.len() * 2);
            for (i, affordance) in self.affordances.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                let style = if focused == Some(i) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                spans.push(Span::styled(format!("[ {} ]", affordance.label), style));
            }
            lines.push(Line::from(spans));
        }

        lines
    }
}

pub fn render_element(element: &A2UIElement) -> ElementRender {
    match element {
        A2UIElement::Text(props) => ElementRender {
            lines: text_lines(&props.content, Style::default()),
            ..Default::default()
        },
        A2UIElement::Heading(props) => {
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if props.level.unwrap_or(1) <= 1 {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            ElementRender {
                lines: text_lines(&props.content, style),
                ..Default::default()
            }
        }
        A2UIElement::OcrResult(props) => {
            let mut lines = vec![caption("Extracted text")];
            lines.extend(text_lines(&props.text, Style::default()));
            ElementRender {
                lines,
                badges: Vec::new(),
                affordances: vec![
                    Affordance {
                        label: "copy".to_string(),
                        action: UiAction::Copy(props.text.clone()),
                    },
                    Affordance {
                        label: "apply to description".to_string(),
                        action: UiAction::ApplyOcr(props.text.clone()),
                    },
                ],
            }
        }
        A2UIElement::ImageAnalysis(analysis) => {
            let mut lines = Vec::new();
            if !analysis.suggested_title.is_empty() {
                lines.push(Line::from(Span::styled(
                    analysis.suggested_title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            lines.extend(text_lines(&analysis.description, Style::default()));
            for feature in &analysis.features {
                lines.push(Line::from(format!("• {feature}")));
            }
            if !analysis.alt_text.is_empty() {
                lines.push(caption(&format!("Alt text: {}", analysis.alt_text)));
            }
            ElementRender {
                lines,
                badges: analysis.tags.clone(),
                affordances: vec![Affordance {
                    label: "apply analysis".to_string(),
                    action: UiAction::ApplyAnalysis(analysis.clone()),
                }],
            }
        }
        A2UIElement::SuggestionChips(props) => ElementRender {
            lines: Vec::new(),
            badges: Vec::new(),
            affordances: props
                .chips
                .iter()
                .map(|chip| Affordance {
                    label: chip.clone(),
                    action: UiAction::Input(chip.clone()),
                })
                .collect(),
        },
        A2UIElement::Card(props) => {
            let mut lines = vec![Line::from(Span::styled(
                props.title.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))];
            lines.extend(text_lines(&props.content, Style::default()));
            ElementRender {
                lines,
                ..Default::default()
            }
        }
        A2UIElement::Unknown { .. } => ElementRender::default(),
    }
}

fn text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.trim()
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn caption(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    ))
}
