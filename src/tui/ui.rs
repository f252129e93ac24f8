use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::state::{App, Phase};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{ListingPanel, MessageList, TitleBar};

/// Below this terminal width the listing panel is hidden.
const PANEL_MIN_TERMINAL_WIDTH: u16 = 100;
const PANEL_WIDTH: u16 = 36;
const ERROR_BANNER_HEIGHT: u16 = 3;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    // Sync InputBox props with App/TUI state
    tui.input_box.attachment = app.composer.attachment.as_ref().map(|a| a.name.clone());
    tui.input_box.dimmed = tui.focus.is_some();

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let error_height = if matches!(app.phase, Phase::Error(_)) {
        ERROR_BANNER_HEIGHT
    } else {
        0
    };
    let [title_area, main_area, error_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(error_height),
        Length(input_height),
    ])
    .areas(frame.area());

    let (messages_area, panel_area) = split_main(main_area);

    let focus = tui.focus_target(app);
    MessageList::new(
        &mut tui.message_list,
        app.transcript.turns(),
        focus,
        app.is_loading(),
        tui.pulse_value,
    )
    .render(frame, messages_area);

    if let Some(panel_area) = panel_area {
        let attachment = app.composer.attachment.as_ref().map(|a| a.name.as_str());
        ListingPanel::new(&app.listing, attachment).render(frame, panel_area);
    }

    // Rendered after the list so the unseen-content flag reflects this frame
    TitleBar::new(
        app.backend.name(),
        app.phase.label(),
        &app.status_message,
        app.notice.as_ref(),
        tui.message_list.has_unseen_content(),
    )
    .render(frame, title_area);

    if let Phase::Error(message) = &app.phase {
        draw_error_banner(frame, error_area, message);
    }

    tui.input_box.render(frame, input_area);
}

fn split_main(area: Rect) -> (Rect, Option<Rect>) {
    if area.width < PANEL_MIN_TERMINAL_WIDTH {
        return (area, None);
    }
    let [messages, panel] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(PANEL_WIDTH)]).areas(area);
    (messages, Some(panel))
}

fn draw_error_banner(frame: &mut Frame, area: Rect, message: &str) {
    let style = Style::default().fg(Color::Red);
    let block = Block::bordered()
        .title("error · Esc to dismiss")
        .border_type(BorderType::Rounded)
        .border_style(style);
    let paragraph = Paragraph::new(message)
        .block(block)
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
