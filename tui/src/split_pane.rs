//! The two-pane overlay: conversation history on top, an editor underneath.
//!
//! [`SplitPane`] negotiates how the terminal's rows are shared, tracks which pane has focus and
//! routes every input chunk. The session ends exactly once, by sending the text that should go
//! back to the caller's editor over the oneshot channel returned from the constructor.

use std::io;
use std::io::Write;

use crossterm::event::KeyCode;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use tokio::sync::oneshot;

use crate::editor::Editor;
use crate::editor::EditorEvent;
use crate::history_pane::HistoryPane;
use crate::history_pane::is_navigation_key;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::key_hint::split_input;
use crate::mouse::MouseReporting;
use crate::mouse::WHEEL_SCROLL_LINES;
use crate::mouse::WheelDirection;
use crate::mouse::parse_sgr_mouse;
use crate::render::line_utils::blank_line;
use crate::style::BorderTone;
use crate::style::Theme;
use crate::tui::FrameRequester;

/// Closes the overlay from either pane, keeping whatever the editor holds.
pub const TOGGLE_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('t'));
const FOCUS_KEY: KeyBinding = key_hint::plain(KeyCode::Tab);
const HISTORY_EXIT_KEYS: [KeyBinding; 3] = [
    key_hint::plain(KeyCode::Esc),
    key_hint::plain(KeyCode::Enter),
    key_hint::plain(KeyCode::Char('q')),
];
const SUBMIT_KEY: KeyBinding = key_hint::plain(KeyCode::Enter);

/// The history pane never gets fewer rows than this, even if the editor needs them.
pub const MIN_HISTORY_ROWS: u16 = 3;

/// Row count assumed until the host reports the real terminal size.
const DEFAULT_TERMINAL_ROWS: u16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    History,
    Editor,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Focus::History => Focus::Editor,
            Focus::Editor => Focus::History,
        }
    }
}

pub struct SplitPane<E: Editor> {
    history: HistoryPane,
    editor: E,
    focus: Focus,
    theme: Theme,
    terminal_rows: u16,
    frame_requester: FrameRequester,
    done_tx: Option<oneshot::Sender<String>>,
    mouse: Option<MouseReporting>,
}

impl<E: Editor> SplitPane<E> {
    pub fn new(
        history: HistoryPane,
        editor: E,
        theme: Theme,
        frame_requester: FrameRequester,
    ) -> (Self, oneshot::Receiver<String>) {
        let (done_tx, done_rx) = oneshot::channel();
        let mut pane = Self {
            history,
            editor,
            focus: Focus::default(),
            theme,
            terminal_rows: DEFAULT_TERMINAL_ROWS,
            frame_requester,
            done_tx: Some(done_tx),
            mouse: None,
        };
        pane.apply_focus_styles();
        (pane, done_rx)
    }

    /// Like [`SplitPane::new`], additionally turning on mouse reporting through `out` so the
    /// wheel scrolls the history. Reporting is switched off again before the session ends.
    pub fn with_mouse_reporting(
        history: HistoryPane,
        editor: E,
        theme: Theme,
        frame_requester: FrameRequester,
        out: Box<dyn Write + Send>,
    ) -> io::Result<(Self, oneshot::Receiver<String>)> {
        let (mut pane, done_rx) = Self::new(history, editor, theme, frame_requester);
        pane.mouse = Some(MouseReporting::enable(out)?);
        Ok((pane, done_rx))
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            self.focus = focus;
            self.apply_focus_styles();
            tracing::debug!(?focus, "split pane focus changed");
            self.frame_requester.schedule_frame();
        }
    }

    pub fn history(&self) -> &HistoryPane {
        &self.history
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn is_finished(&self) -> bool {
        self.done_tx.is_none()
    }

    pub fn mouse_reporting_enabled(&self) -> bool {
        self.mouse.as_ref().is_some_and(MouseReporting::is_enabled)
    }

    /// Total terminal rows; one of them is left to the host's status line.
    pub fn set_terminal_rows(&mut self, rows: u16) {
        self.terminal_rows = rows;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.history.set_theme(theme);
        self.apply_focus_styles();
        self.editor.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.history.invalidate();
        self.editor.invalidate();
    }

    fn apply_focus_styles(&mut self) {
        let editor_tone = BorderTone::for_focus(self.focus == Focus::Editor);
        self.editor.set_border_style(editor_tone.resolve(&self.theme));
        self.history.set_focused(self.focus == Focus::History);
    }

    /// Lay out both panes into exactly `terminal_rows - 1` lines.
    pub fn render(&mut self, width: u16) -> Vec<Line<'static>> {
        let total_rows = self.terminal_rows.saturating_sub(1);
        self.apply_focus_styles();

        let editor_lines = self.editor.render(width);
        let editor_rows = u16::try_from(editor_lines.len()).unwrap_or(u16::MAX);
        let history_rows = total_rows.saturating_sub(editor_rows).max(MIN_HISTORY_ROWS);
        self.history.set_viewport_height(history_rows);

        let mut lines = self.history.render(width);
        lines.extend(editor_lines);
        // Oversized layouts lose editor rows from the bottom.
        lines.resize_with(usize::from(total_rows), || blank_line(width));
        lines
    }

    /// Route one raw input chunk. Batched sequences are split and routed one at a time.
    pub fn handle_input(&mut self, data: &str) {
        for unit in split_input(data) {
            if self.is_finished() {
                tracing::debug!("input after the overlay finished; ignoring");
                return;
            }
            self.route(unit);
        }
    }

    fn route(&mut self, data: &str) {
        if self.mouse.is_some()
            && let Some(event) = parse_sgr_mouse(data)
        {
            let key = match event.wheel() {
                Some(WheelDirection::Up) => "k",
                Some(WheelDirection::Down) => "j",
                None => return,
            };
            for _ in 0..WHEEL_SCROLL_LINES {
                self.history.handle_input(key);
            }
            return;
        }

        if TOGGLE_KEY.matches(data) {
            let text = self.editor.text();
            self.finish(text);
            return;
        }

        if FOCUS_KEY.matches(data) {
            self.set_focus(self.focus.toggled());
            return;
        }

        match self.focus {
            Focus::History => {
                if HISTORY_EXIT_KEYS.iter().any(|binding| binding.matches(data)) {
                    let text = self.editor.text();
                    self.finish(text);
                } else if is_navigation_key(data) {
                    self.history.handle_input(data);
                }
            }
            Focus::Editor => match self.editor.handle_input(data) {
                EditorEvent::Submitted(text) => self.finish(text),
                EditorEvent::Escaped => {
                    let text = self.editor.text();
                    self.finish(text);
                }
                EditorEvent::None => self.frame_requester.schedule_frame(),
            },
        }
    }

    fn finish(&mut self, text: String) {
        let Some(done_tx) = self.done_tx.take() else {
            tracing::warn!("overlay already finished; ignoring repeated exit");
            return;
        };
        if let Some(mouse) = self.mouse.as_mut()
            && let Err(err) = mouse.disable()
        {
            tracing::warn!("failed to disable mouse reporting: {err}");
        }
        tracing::info!(chars = text.chars().count(), "history overlay finished");
        if done_tx.send(text).is_err() {
            tracing::debug!("overlay receiver dropped before completion");
        }
    }

    /// Key hints for the host's status row, depending on focus.
    pub fn status_line(&self) -> Line<'static> {
        let sep = || " · ".dim();
        let mut spans: Vec<Span<'static>> = Vec::new();
        match self.focus {
            Focus::History => {
                spans.push(FOCUS_KEY.into());
                spans.push(" edit".dim());
                spans.push(sep());
                spans.push(key_hint::plain(KeyCode::Char('q')).into());
                spans.push(" close".dim());
            }
            Focus::Editor => {
                spans.push(SUBMIT_KEY.into());
                spans.push(" submit".dim());
                spans.push(sep());
                spans.push(FOCUS_KEY.into());
                spans.push(" history".dim());
            }
        }
        spans.push(sep());
        spans.push(TOGGLE_KEY.into());
        spans.push(" close".dim());
        Line::from(spans)
    }
}
