//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm. It also
//! owns the side effects the reducer asks for: spawning and aborting request
//! tasks, reading attachment files, and writing to the clipboard.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Loading**: draws every ~80ms so the streaming turn's border can pulse.
//! - **Idle**: sleeps up to 500ms, only redraws on events, background
//!   actions or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.
//!
//! ## Keys
//!
//! | key           | effect                                                        |
//! |---------------|---------------------------------------------------------------|
//! | Enter         | activate the focused affordance, else send the composer text  |
//! | Tab/Shift+Tab | move focus across the newest element's affordances            |
//! | Esc           | cancel the reply, else dismiss the error, focus or notice     |
//! | Ctrl+C        | quit                                                          |

pub mod clipboard;
mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, OutboundRequest, update};
use crate::core::attachment::SelectedFile;
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::UiAction;
use crate::core::state::{App, Phase, RequestId};
use crate::inference::{ChatBackend, HttpBackend, IngestEvent, MalformedEnvelope, ingest};
use crate::tui::clipboard::SystemClipboard;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, render_element};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Focused affordance of the newest element, if any
    pub focus: Option<usize>,
    // Animation state
    pub pulse_value: f32,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            focus: None,
            pulse_value: 0.0,
        }
    }

    /// `(turn index, affordance index)` of the focus, if it still points at
    /// an affordance of the newest element.
    pub fn focus_target(&self, app: &App) -> Option<(usize, usize)> {
        let affordance = self.focus?;
        let (turn, element) = app.transcript.latest_element()?;
        (affordance < render_element(element).affordances.len()).then_some((turn, affordance))
    }

    /// Moves focus across the newest element's affordances, wrapping around.
    pub fn cycle_focus(&mut self, app: &App, forward: bool) {
        let count = app
            .transcript
            .latest_element()
            .map(|(_, element)| render_element(element).affordances.len())
            .unwrap_or(0);
        if count == 0 {
            self.focus = None;
            return;
        }
        self.focus = Some(match (self.focus.filter(|&i| i < count), forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });
    }

    /// The action behind the focused affordance.
    pub fn focused_action(&self, app: &App) -> Option<UiAction> {
        let (_, affordance) = self.focus_target(app)?;
        let (_, element) = app.transcript.latest_element()?;
        let mut action = None;
        render_element(element).activate(affordance, |a| action = Some(a));
        action
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // The Kitty keyboard protocol lets Shift+Enter be told apart from Enter.
        // Terminals that don't support it ignore the request.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// The task serving the active request.
struct RunningRequest {
    id: RequestId,
    handle: AbortHandle,
}

/// Carries out an effect. Returns true when the loop should stop.
fn apply_effect(
    effect: Effect,
    app: &App,
    running: &mut Option<RunningRequest>,
    tx: &mpsc::Sender<Action>,
) -> bool {
    match effect {
        Effect::None => false,
        Effect::SpawnRequest(request) => {
            if let Some(previous) = running.take() {
                previous.handle.abort();
            }
            let id = request.id;
            let handle = spawn_request(app.backend.clone(), request, app.malformed_policy, tx.clone());
            *running = Some(RunningRequest { id, handle });
            false
        }
        Effect::AbortRequest(id) => {
            match running.take() {
                Some(task) if task.id == id => {
                    info!("Aborting request {}", id);
                    task.handle.abort();
                }
                other => {
                    debug!("No running task for request {}", id);
                    *running = other;
                }
            }
            false
        }
        Effect::Quit => true,
    }
}

fn attach(app: &App, path: &Path) -> Action {
    match SelectedFile::read(path, app.max_attachment_bytes) {
        Ok(file) => Action::AttachFile(file),
        Err(e) => Action::AttachmentRejected(e.to_string()),
    }
}

/// Routes an event through the composer. Text the app would refuse stays in
/// the composer so it can be sent once the reply or error is out of the way.
fn composer_action(app: &App, input_box: &mut InputBox, event: &TuiEvent) -> Option<Action> {
    match input_box.handle_event(event)? {
        InputEvent::Submit(text) => {
            if !app.accepts_submission() {
                input_box.restore(text.clone());
            }
            Some(Action::Submit(text))
        }
        InputEvent::Attach(path) => Some(attach(app, &path)),
        InputEvent::Detach => Some(Action::DetachFile),
        InputEvent::ContentChanged => None,
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend: Arc<dyn ChatBackend> =
        match HttpBackend::new(&config.endpoint_url, config.connect_timeout) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!("Cannot start with endpoint {}: {}", config.endpoint_url, e);
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
            }
        };
    let mut app = App::from_config(backend, Box::new(SystemClipboard::new()), &config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut running: Option<RunningRequest> = None;

    // Animation timer
    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        let animating = app.is_loading();
        if animating {
            needs_redraw = true;
        }

        // Only draw when something changed
        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let action = match event {
                TuiEvent::Resize => None,
                TuiEvent::ForceQuit => Some(Action::Quit),
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                    None
                }
                TuiEvent::FocusNext => {
                    tui.cycle_focus(&app, true);
                    None
                }
                TuiEvent::FocusPrev => {
                    tui.cycle_focus(&app, false);
                    None
                }
                TuiEvent::Escape => escape_action(&app, &mut tui),
                TuiEvent::Submit if tui.focus_target(&app).is_some() => {
                    let action = tui.focused_action(&app).map(Action::Ui);
                    tui.focus = None;
                    action
                }
                _ => composer_action(&app, &mut tui.input_box, &event),
            };

            if let Some(action) = action {
                let effect = update(&mut app, action);
                if apply_effect(effect, &app, &mut running, &tx) {
                    break 'main;
                }
            }
        }

        // Handle background task actions (streaming responses)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let settled = matches!(
                action,
                Action::EnvelopeReady { .. } | Action::RequestFailed { .. }
            );
            let effect = update(&mut app, action);
            if settled && !app.is_loading() {
                running = None;
                // The newest element may have changed under the focus
                tui.focus = None;
            }
            if apply_effect(effect, &app, &mut running, &tx) {
                break 'main;
            }
        }
    }

    if let Some(task) = running.take() {
        task.handle.abort();
    }
    ratatui::restore();
    Ok(())
}

/// Esc peels back one layer: a running reply, an error, affordance focus,
/// then the current notice.
fn escape_action(app: &App, tui: &mut TuiState) -> Option<Action> {
    if app.is_loading() {
        return Some(Action::Cancel);
    }
    if matches!(app.phase, Phase::Error(_)) {
        return Some(Action::AcknowledgeError);
    }
    if tui.focus.take().is_some() {
        return None;
    }
    app.notice.as_ref().map(|_| Action::DismissNotice)
}

fn spawn_request(
    backend: Arc<dyn ChatBackend>,
    request: OutboundRequest,
    policy: MalformedEnvelope,
    tx: mpsc::Sender<Action>,
) -> AbortHandle {
    info!("Spawning request {} to {}", request.id, backend.name());
    tokio::spawn(run_request(backend, request, policy, tx)).abort_handle()
}

/// Sends one request and reports its progress as actions tagged with the
/// request id.
pub(crate) async fn run_request(
    backend: Arc<dyn ChatBackend>,
    request: OutboundRequest,
    policy: MalformedEnvelope,
    tx: mpsc::Sender<Action>,
) {
    let id = request.id;
    let send = |action: Action| {
        if tx.send(action).is_err() {
            warn!("Request {}: receiver dropped", id);
        }
    };

    let started = Instant::now();
    let chunks = match backend.open(&request.body).await {
        Ok(chunks) => chunks,
        Err(e) => {
            info!("Request {} failed before streaming: {}", id, e);
            send(Action::RequestFailed {
                request: id,
                error: e.to_string(),
            });
            return;
        }
    };
    debug!("Request {} opened after {}ms", id, started.elapsed().as_millis());
    send(Action::StreamOpened { request: id });

    let result = ingest(chunks, policy, |event| {
        send(match event {
            IngestEvent::Partial(text) => Action::Provisional { request: id, text },
            IngestEvent::Complete(envelope) => Action::EnvelopeReady {
                request: id,
                envelope,
            },
        })
    })
    .await;

    match result {
        Ok(()) => info!(
            "Request {} complete after {}ms",
            id,
            started.elapsed().as_millis()
        ),
        Err(e) => {
            info!("Request {} stream failed: {}", id, e);
            send(Action::RequestFailed {
                request: id,
                error: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2ui::{A2UIElement, OcrResultProps, SuggestionChipsProps};
    use crate::core::state::NoticeLevel;
    use crate::inference::{BackendError, ChatRequest};
    use crate::core::transcript::Role;
    use crate::test_support::{RecordingClipboard, Script, ScriptedBackend, test_app};

    fn outbound(id: RequestId) -> OutboundRequest {
        OutboundRequest {
            id,
            body: ChatRequest {
                messages: Vec::new(),
                image_url: None,
            },
        }
    }

    async fn collect(backend: ScriptedBackend, policy: MalformedEnvelope) -> Vec<Action> {
        let (tx, rx) = mpsc::channel();
        run_request(Arc::new(backend), outbound(7), policy, tx).await;
        rx.try_iter().collect()
    }

    fn with_element(element: A2UIElement) -> App {
        let mut app = test_app();
        app.transcript
            .append_user_turn("hi".to_string(), None)
            .unwrap();
        app.transcript.begin_assistant_turn().unwrap();
        app.transcript
            .finalize_assistant_turn("here".to_string(), Some(element))
            .unwrap();
        app
    }

    fn chips() -> A2UIElement {
        A2UIElement::SuggestionChips(SuggestionChipsProps {
            chips: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        })
    }

    #[tokio::test]
    async fn test_run_request_streams_then_completes() {
        let backend = ScriptedBackend::streaming(&[r#"{"message":"Hi"#, r#" there"}"#]);
        let actions = collect(backend, MalformedEnvelope::Fail).await;

        assert!(matches!(actions[0], Action::StreamOpened { request: 7 }));
        assert!(matches!(
            &actions[1],
            Action::Provisional { request: 7, text } if text == r#"{"message":"Hi"#
        ));
        match actions.last() {
            Some(Action::EnvelopeReady { request: 7, envelope }) => {
                assert_eq!(envelope.message, "Hi there");
            }
            other => panic!("expected EnvelopeReady, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_request_refused() {
        let backend = ScriptedBackend::new(vec![Script::Refuse(BackendError::Api {
            status: 503,
            message: "busy".to_string(),
        })]);
        let actions = collect(backend, MalformedEnvelope::Fail).await;

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::RequestFailed { request: 7, error } => assert!(error.contains("503")),
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_request_mid_stream_failure() {
        let backend = ScriptedBackend::new(vec![Script::Stream(vec![
            Ok(r#"{"message":"Hel"#.to_string()),
            Err(BackendError::Network("connection reset".to_string())),
        ])]);
        let actions = collect(backend, MalformedEnvelope::Fail).await;

        match actions.last() {
            Some(Action::RequestFailed { request: 7, error }) => {
                assert!(error.contains("connection reset"))
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        assert!(!actions
            .iter()
            .any(|a| matches!(a, Action::EnvelopeReady { .. })));
    }

    #[tokio::test]
    async fn test_run_request_truncated_stream_fails() {
        let backend = ScriptedBackend::streaming(&[r#"{"message":"Hel"#]);
        let actions = collect(backend, MalformedEnvelope::Fail).await;
        assert!(matches!(
            actions.last(),
            Some(Action::RequestFailed { request: 7, .. })
        ));
    }

    #[tokio::test]
    async fn test_run_request_plain_text_policy() {
        let backend = ScriptedBackend::streaming(&["Sorry, ", "I can't help."]);
        let actions = collect(backend, MalformedEnvelope::PlainText).await;
        match actions.last() {
            Some(Action::EnvelopeReady { envelope, .. }) => {
                assert_eq!(envelope.message, "Sorry, I can't help.");
                assert!(envelope.ui.is_none());
            }
            other => panic!("expected EnvelopeReady, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_actions_after_cancel_are_ignored() {
        let mut app = test_app();
        let request = match update(&mut app, Action::Submit("hello".to_string())) {
            Effect::SpawnRequest(request) => request,
            other => panic!("expected SpawnRequest, got {:?}", other),
        };
        assert_eq!(
            update(&mut app, Action::Cancel),
            Effect::AbortRequest(request.id)
        );

        // The task finishes anyway; nothing it reports may land.
        let backend = ScriptedBackend::streaming(&[r#"{"message":"late"}"#]);
        let (tx, rx) = mpsc::channel();
        run_request(Arc::new(backend), request, MalformedEnvelope::Fail, tx).await;
        for action in rx.try_iter() {
            assert_eq!(update(&mut app, action), Effect::None);
        }
        assert_eq!(app.phase, Phase::Idle);
        assert!(app.transcript.turns().iter().all(|t| t.content != "late"));
    }

    #[tokio::test]
    async fn test_backend_receives_history_and_image_once() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Script::Stream(vec![Ok(r#"{"message":"A walnut side table"}"#.to_string())]),
            Script::Stream(vec![Ok(r#"{"message":"About $80"}"#.to_string())]),
        ]));
        let mut app = App::new(backend.clone(), Box::new(RecordingClipboard::default()));
        update(
            &mut app,
            Action::AttachFile(SelectedFile {
                name: "table.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            }),
        );

        for text in ["What is this?", "What is it worth?"] {
            let request = match update(&mut app, Action::Submit(text.to_string())) {
                Effect::SpawnRequest(request) => request,
                other => panic!("expected SpawnRequest, got {:?}", other),
            };
            let (tx, rx) = mpsc::channel();
            run_request(backend.clone(), request, MalformedEnvelope::Fail, tx).await;
            for action in rx.try_iter() {
                update(&mut app, action);
            }
            assert_eq!(app.phase, Phase::Idle);
        }

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 1);
        assert!(
            requests[0]
                .image_url
                .as_deref()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );

        let second = &requests[1];
        let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["What is this?", "A walnut side table", "What is it worth?"]
        );
        assert_eq!(second.messages[1].role, Role::Assistant);
        assert_eq!(second.image_url, None);
    }

    #[test]
    fn test_rejected_submit_keeps_composer_text() {
        let mut app = test_app();
        app.phase = Phase::Sending;
        let mut input = InputBox::new();
        for c in "still there".chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }

        let action = composer_action(&app, &mut input, &TuiEvent::Submit);
        assert!(matches!(action, Some(Action::Submit(ref text)) if text == "still there"));
        assert_eq!(input.buffer, "still there");

        assert_eq!(update(&mut app, action.unwrap()), Effect::None);
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn test_accepted_submit_clears_composer() {
        let app = test_app();
        let mut input = InputBox::new();
        input.restore("hello".to_string());

        let action = composer_action(&app, &mut input, &TuiEvent::Submit);
        assert!(matches!(action, Some(Action::Submit(ref text)) if text == "hello"));
        assert!(input.buffer.is_empty());
    }

    #[test]
    fn test_cycle_focus_wraps() {
        let app = with_element(chips());
        let mut tui = TuiState::new();

        tui.cycle_focus(&app, true);
        assert_eq!(tui.focus_target(&app), Some((1, 0)));
        tui.cycle_focus(&app, false);
        assert_eq!(tui.focus, Some(2));
        tui.cycle_focus(&app, true);
        assert_eq!(tui.focus, Some(0));
    }

    #[test]
    fn test_cycle_focus_without_element_clears() {
        let app = test_app();
        let mut tui = TuiState::new();
        tui.focus = Some(1);
        tui.cycle_focus(&app, true);
        assert_eq!(tui.focus, None);
        assert_eq!(tui.focus_target(&app), None);
    }

    #[test]
    fn test_focused_action_is_affordance_action() {
        let app = with_element(A2UIElement::OcrResult(OcrResultProps {
            text: "SKU 1".to_string(),
        }));
        let mut tui = TuiState::new();
        tui.focus = Some(1);
        assert_eq!(
            tui.focused_action(&app),
            Some(UiAction::ApplyOcr("SKU 1".to_string()))
        );
        tui.focus = Some(5);
        assert_eq!(tui.focused_action(&app), None);
    }

    #[test]
    fn test_escape_peels_layers() {
        let mut app = with_element(chips());
        let mut tui = TuiState::new();

        app.phase = Phase::Streaming;
        assert!(matches!(escape_action(&app, &mut tui), Some(Action::Cancel)));

        app.phase = Phase::Error("boom".to_string());
        assert!(matches!(
            escape_action(&app, &mut tui),
            Some(Action::AcknowledgeError)
        ));

        app.phase = Phase::Idle;
        tui.focus = Some(0);
        assert!(escape_action(&app, &mut tui).is_none());
        assert_eq!(tui.focus, None);

        app.notify(NoticeLevel::Info, "Copied");
        assert!(matches!(
            escape_action(&app, &mut tui),
            Some(Action::DismissNotice)
        ));
    }

    #[test]
    fn test_attach_missing_file_is_rejected() {
        let app = test_app();
        let action = attach(&app, Path::new("/definitely/not/here.png"));
        assert!(matches!(action, Action::AttachmentRejected(_)));
    }

    #[tokio::test]
    async fn test_abort_effect_stops_matching_task_only() {
        let app = test_app();
        let (tx, _rx) = mpsc::channel();
        let handle = tokio::spawn(std::future::pending::<()>()).abort_handle();
        let mut running = Some(RunningRequest {
            id: 3,
            handle: handle.clone(),
        });

        assert!(!apply_effect(Effect::AbortRequest(2), &app, &mut running, &tx));
        assert!(running.is_some());

        assert!(!apply_effect(Effect::AbortRequest(3), &app, &mut running, &tx));
        assert!(running.is_none());

        assert!(apply_effect(Effect::Quit, &app, &mut running, &tx));
    }
}
