use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// A reusable UI component.
///
/// Components receive data via props (struct fields), may hold `&mut` state
/// owned by `TuiState`, and draw into the `Rect` they are given.
///
/// `render` takes `&mut self` so a component can refresh caches (the
/// message list's height cache) or presentation state (scroll offsets)
/// while drawing, in the spirit of ratatui's `StatefulWidget`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that turns terminal events into its own higher-level events.
pub trait EventHandler {
    type Event;

    /// Returns `None` when the event was consumed without anything for the
    /// parent to act on.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
