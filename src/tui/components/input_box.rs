//! # InputBox Component
//!
//! Handles the composer: message text plus the attach/detach commands.
//!
//! ## Responsibilities
//!
//! - Capture text input
//! - Handle editing (backspace, delete, cursor movement, paste)
//! - Turn `/attach <path>` and `/detach` into attachment events
//! - Handle submission (Enter)
//!
//! ## State Management
//!
//! The buffer and cursor are internal state. The pending attachment name
//! and the dimmed flag are props from the application state.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;
/// The box grows with its content up to this many lines, then scrolls.
const MAX_VISIBLE_LINES: u16 = 6;

const ATTACH_COMMAND: &str = "/attach";
const DETACH_COMMAND: &str = "/detach";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// `/attach <path>`
    Attach(PathBuf),
    /// `/detach`
    Detach,
    ContentChanged,
}

pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Byte offset of the cursor in `buffer`
    cursor: usize,
    /// Name of the pending attachment (Prop)
    pub attachment: Option<String>,
    /// Drawn dimmed while an affordance has focus (Prop)
    pub dimmed: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            attachment: None,
            dimmed: false,
        }
    }

    /// Calculate required height for current buffer content, clamped to viewport limits.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let lines = wrap(&self.buffer, inner_width(width)).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> String {
        match &self.attachment {
            Some(name) => format!("Message · 📎 {name} (/detach to remove)"),
            None => String::from("Message (/attach <path> adds a photo)"),
        }
    }

    /// Wrapped line and column of the cursor.
    fn cursor_position(&self, width: usize) -> (u16, u16) {
        let before = wrap(&self.buffer[..self.cursor], width);
        let row = before.len().saturating_sub(1) as u16;
        let col = before.last().map(|l| l.width()).unwrap_or(0) as u16;
        (row, col)
    }

    /// Puts back text that was taken by a submission the app refused.
    pub fn restore(&mut self, text: String) {
        self.cursor = text.len();
        self.buffer = text;
    }

    fn take_buffer(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    fn submit(&mut self) -> Option<InputEvent> {
        let trimmed = self.buffer.trim();
        if trimmed == DETACH_COMMAND {
            self.take_buffer();
            return Some(InputEvent::Detach);
        }
        if let Some(rest) = trimmed.strip_prefix(ATTACH_COMMAND)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let path = rest.trim();
            if path.is_empty() {
                return None;
            }
            let path = expand_home(path);
            self.take_buffer();
            return Some(InputEvent::Attach(path));
        }
        Some(InputEvent::Submit(self.take_buffer()))
    }
}

fn inner_width(width: u16) -> usize {
    width.saturating_sub(2).max(1) as usize
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let options = textwrap::Options::new(width)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    s[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(pos)
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        let lines = wrap(&self.buffer, width);
        let (cursor_row, cursor_col) = self.cursor_position(width);
        let scroll = cursor_row.saturating_sub(MAX_VISIBLE_LINES - 1);

        let mut style = Style::default().fg(Color::Green);
        if self.dimmed {
            style = style.add_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(self.title());

        let visible = lines
            .iter()
            .skip(scroll as usize)
            .take(MAX_VISIBLE_LINES as usize)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        frame.render_widget(Paragraph::new(visible).block(block).style(style), area);

        if !self.dimmed {
            let x = area.x + 1 + cursor_col.min(area.width.saturating_sub(3));
            let y = area.y + 1 + (cursor_row - scroll);
            frame.set_cursor_position((x, y));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete => {
                if self.cursor >= self.buffer.len() {
                    return None;
                }
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorRight => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = 0;
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer.len();
                None
            }
            TuiEvent::Submit => self.submit(),
            _ => None,
        }
    }
}
