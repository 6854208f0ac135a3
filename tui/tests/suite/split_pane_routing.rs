use history_split_tui::Editor;
use history_split_tui::EditorEvent;
use history_split_tui::Focus;
use history_split_tui::SplitPane;
use history_split_tui::TextEditor;
use history_split_tui::Theme;
use history_split_tui::split_pane::MIN_HISTORY_ROWS;
use pretty_assertions::assert_eq;
use ratatui::style::Style;
use ratatui::text::Line;
use tokio::sync::oneshot::error::TryRecvError;

use super::support::TerminalSink;
use super::support::frame_requester;
use super::support::history_pane;
use super::support::one_line_entries;

/// Editor stand-in whose height is chosen by the test.
struct TallEditor {
    rows: usize,
}

impl Editor for TallEditor {
    fn render(&mut self, _width: u16) -> Vec<Line<'static>> {
        vec![Line::from("editor"); self.rows]
    }

    fn handle_input(&mut self, _data: &str) -> EditorEvent {
        EditorEvent::None
    }

    fn text(&self) -> String {
        String::new()
    }

    fn set_text(&mut self, _text: &str) {}

    fn set_border_style(&mut self, _style: Style) {}

    fn invalidate(&mut self) {}
}

#[tokio::test]
async fn q_in_history_exits_with_editor_text() {
    let entries = one_line_entries(20);
    let (mut pane, mut done) = SplitPane::new(
        history_pane(&entries, 3),
        TextEditor::new("unsent"),
        Theme::default(),
        frame_requester(),
    );
    pane.set_terminal_rows(16);
    pane.render(60);
    let offset = pane.history().scroll_offset();

    pane.handle_input("x");
    assert_eq!(done.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(pane.focus(), Focus::History);
    assert_eq!(pane.history().scroll_offset(), offset);
    assert_eq!(pane.editor().text(), "unsent");

    pane.handle_input("q");
    assert_eq!(done.try_recv(), Ok("unsent".to_string()));
}

#[tokio::test]
async fn enter_and_escape_also_exit_from_history() {
    for key in ["\r", "\x1b"] {
        let entries = one_line_entries(3);
        let (mut pane, mut done) = SplitPane::new(
            history_pane(&entries, 3),
            TextEditor::new("kept"),
            Theme::default(),
            frame_requester(),
        );
        pane.handle_input(key);
        assert_eq!(done.try_recv(), Ok("kept".to_string()), "key {key:?}");
    }
}

#[tokio::test]
async fn editor_focus_forwards_everything_to_the_editor() {
    let entries = one_line_entries(3);
    let (mut pane, mut done) = SplitPane::new(
        history_pane(&entries, 3),
        TextEditor::new(""),
        Theme::default(),
        frame_requester(),
    );
    pane.handle_input("\t");
    assert_eq!(pane.focus(), Focus::Editor);

    for key in ["q", "j", "G"] {
        pane.handle_input(key);
    }
    assert_eq!(pane.editor().text(), "qjG");
    assert_eq!(done.try_recv(), Err(TryRecvError::Empty));

    pane.handle_input("\r");
    assert_eq!(done.try_recv(), Ok("qjG".to_string()));
}

#[tokio::test]
async fn toggle_key_from_editor_returns_draft_and_releases_the_mouse() {
    let sink = TerminalSink::default();
    let entries = one_line_entries(10);
    let (mut pane, mut done) = SplitPane::with_mouse_reporting(
        history_pane(&entries, 3),
        TextEditor::new(""),
        Theme::default(),
        frame_requester(),
        Box::new(sink.clone()),
    )
    .expect("mouse reporting");
    assert!(pane.mouse_reporting_enabled());

    pane.set_focus(Focus::Editor);
    for ch in ["d", "r", "a", "f", "t"] {
        pane.handle_input(ch);
    }
    pane.handle_input("\x14");

    assert_eq!(done.try_recv(), Ok("draft".to_string()));
    assert!(!pane.mouse_reporting_enabled());
    assert_eq!(
        sink.contents(),
        "\x1b[?1000h\x1b[?1006h\x1b[?1000l\x1b[?1006l"
    );

    drop(pane);
    assert!(sink.contents().ends_with("\x1b[?1000l\x1b[?1006l"));
    assert_eq!(sink.contents().matches("\x1b[?1000l").count(), 1);
}

#[tokio::test]
async fn layout_is_always_rows_minus_one() {
    let rows: u16 = 24;
    for editor_rows in 1..=(usize::from(rows) + 6) {
        let entries = one_line_entries(40);
        let (mut pane, _done) = SplitPane::new(
            history_pane(&entries, 3),
            TallEditor { rows: editor_rows },
            Theme::default(),
            frame_requester(),
        );
        pane.set_terminal_rows(rows);
        let lines = pane.render(70);
        assert_eq!(lines.len(), usize::from(rows) - 1, "editor rows {editor_rows}");
        assert!(pane.history().viewport_height() >= MIN_HISTORY_ROWS);
    }
}

#[tokio::test]
async fn history_takes_the_rows_the_editor_leaves() {
    let entries = one_line_entries(40);
    let (mut pane, _done) = SplitPane::new(
        history_pane(&entries, 3),
        TallEditor { rows: 5 },
        Theme::default(),
        frame_requester(),
    );
    pane.set_terminal_rows(30);
    let lines = pane.render(70);
    assert_eq!(pane.history().viewport_height(), 24);
    assert_eq!(history_split_tui::line_to_plain_string(&lines[24]), "editor");
}
