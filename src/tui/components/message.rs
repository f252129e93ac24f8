use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::core::transcript::{ChatTurn, Role, TurnStatus};
use crate::tui::component::Component;
use crate::tui::components::element::ElementRender;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Pulse intensity threshold above which the border transitions from normal to BOLD.
const PULSE_BOLD_THRESHOLD: f32 = 0.6;
/// Pulse intensity threshold above which the border transitions from DIM to normal.
const PULSE_NORMAL_THRESHOLD: f32 = 0.2;

/// A stateless component that renders one transcript turn.
///
/// # Design
///
/// `Message` is a **transient component**: it's created fresh each frame with
/// the turn it shows and, for assistant turns carrying an element, the
/// element's pre-computed [`ElementRender`]. The turn's text comes first; the
/// element is drawn under it after a blank line.
///
/// # Styling
///
/// - **User** (green)
/// - **Assistant** (blue), pulsing while its reply streams in
/// - **Abandoned reply** (dark gray, italic): cancelled or failed exchange
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// with `textwrap` options that match `Paragraph` wrapping, so the parent
/// `MessageList` can lay out the scroll canvas without rendering.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub turn: &'a ChatTurn,
    pub element: Option<&'a ElementRender>,
    /// Highlighted affordance of `element`
    pub focused: Option<usize>,
    /// Current pulse intensity (0.0 to 1.0) for active generation animation
    pub pulse_intensity: f32,
}

impl<'a> Message<'a> {
    pub fn new(
        turn: &'a ChatTurn,
        element: Option<&'a ElementRender>,
        focused: Option<usize>,
        pulse_intensity: f32,
    ) -> Self {
        Self {
            turn,
            element,
            focused,
            pulse_intensity,
        }
    }

    /// Calculate the height required for this turn given a width.
    pub fn calculate_height(turn: &ChatTurn, element: Option<&ElementRender>, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding.
            return 1;
        }

        let text = body_lines(turn, element, None)
            .iter()
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n");

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(&text, options);
        u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

fn title(turn: &ChatTurn) -> String {
    let mut title = match turn.role {
        Role::User => String::from("you"),
        Role::Assistant => String::from("assistant"),
    };
    if turn.attachment.is_some() {
        title.push_str(" · image");
    }
    if turn.status == TurnStatus::Abandoned {
        title.push_str(" · no reply");
    }
    title
}

fn turn_style(turn: &ChatTurn) -> Style {
    match (turn.role, turn.status) {
        (_, TurnStatus::Abandoned) => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        (Role::User, _) => Style::default().fg(Color::Green),
        (Role::Assistant, _) => Style::default().fg(Color::Blue),
    }
}

/// Text lines first, then the element.
fn body_lines<'a>(
    turn: &'a ChatTurn,
    element: Option<&ElementRender>,
    focused: Option<usize>,
) -> Vec<Line<'a>> {
    let content = turn.content.trim();
    let mut lines: Vec<Line<'a>> = if content.is_empty() && turn.is_open() {
        vec![Line::from("…")]
    } else {
        content.lines().map(Line::from).collect()
    };

    if let Some(element) = element.filter(|e| !e.is_empty()) {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.extend(element.to_lines(focused));
    }
    lines
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = turn_style(self.turn);

        let mut border_style = style.add_modifier(Modifier::DIM);
        if self.focused.is_some() {
            border_style = Style::default().fg(Color::Cyan);
        }

        // Three-phase breathing: DIM → normal → BOLD
        if self.pulse_intensity > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > PULSE_NORMAL_THRESHOLD {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .title(Span::styled(title(self.turn), border_style))
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(body_lines(self.turn, self.element, self.focused))
            .style(style)
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
