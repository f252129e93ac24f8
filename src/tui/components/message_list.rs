//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Display every turn, with rendered elements under assistant replies
//! - Manage scrolling and stick-to-bottom while a reply streams in
//! - Cache per-turn heights so only changed turns are re-measured
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the turns (props).

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::transcript::{ChatTurn, TurnStatus};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::element::{ElementRender, render_element};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// True when content extends below the viewport.
    pub fn has_unseen_content(&self) -> bool {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        !self.stick_to_bottom && self.scroll_state.offset().y < max_y
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub turns: &'a [ChatTurn],
    /// `(turn index, affordance index)` of the focused affordance
    pub focus: Option<(usize, usize)>,
    pub is_loading: bool,
    pub pulse_value: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        turns: &'a [ChatTurn],
        focus: Option<(usize, usize)>,
        is_loading: bool,
        pulse_value: f32,
    ) -> Self {
        Self {
            state,
            turns,
            focus,
            is_loading,
            pulse_value,
        }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        let elements: Vec<Option<ElementRender>> = self
            .turns
            .iter()
            .map(|turn| turn.ui.as_ref().map(render_element))
            .collect();

        // 1. Update layout cache
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.turns, content_width);
        layout.heights.truncate(reusable);
        for (i, turn) in self.turns.iter().enumerate().skip(reusable) {
            layout
                .heights
                .push(Message::calculate_height(turn, elements[i].as_ref(), content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(self.turns, content_width);

        let total_height = self.state.layout.total_height();

        // 2. Clamp scroll offset
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible turns into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let turn = &self.turns[i];
            let height = self.state.layout.heights[i];
            let focused = self
                .focus
                .and_then(|(turn_idx, affordance)| (turn_idx == i).then_some(affordance));
            let pulse_intensity = if turn.is_open() && self.is_loading {
                self.pulse_value
            } else {
                0.0
            };

            let rect = Rect::new(0, y_offset, content_width, height);
            let message = Message::new(turn, elements[i].as_ref(), focused, pulse_intensity);
            scroll_view.render_widget(message, rect);
            y_offset = y_offset.saturating_add(height);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached layout measurements.
///
/// A turn's height only changes while it is open or when its status flips,
/// so the cache stores each measured turn's status and re-measures from the
/// first turn whose status differs.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    statuses: Vec<TurnStatus>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            statuses: Vec::new(),
            content_width: 0,
        }
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn reusable_count(&self, turns: &[ChatTurn], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        let cached = self.heights.len().min(self.statuses.len()).min(turns.len());
        turns[..cached]
            .iter()
            .zip(&self.statuses)
            .position(|(turn, &status)| status != turn.status || status == TurnStatus::Open)
            .unwrap_or(cached)
    }

    pub fn update_metadata(&mut self, turns: &[ChatTurn], content_width: u16) {
        self.statuses = turns.iter().map(|t| t.status).collect();
        self.content_width = content_width;
    }

    /// Running totals saturate at `u16::MAX`, the tallest canvas a
    /// `ScrollView` can address.
    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
