use history_split_tui::Editor;
use history_split_tui::Focus;
use history_split_tui::SplitPane;
use history_split_tui::TextEditor;
use history_split_tui::Theme;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot::error::TryRecvError;

use super::support::TerminalSink;
use super::support::frame_requester;
use super::support::history_pane;
use super::support::one_line_entries;

fn mouse_pane(
    sink: &TerminalSink,
) -> (
    SplitPane<TextEditor>,
    tokio::sync::oneshot::Receiver<String>,
) {
    let entries = one_line_entries(60);
    let (mut pane, done) = SplitPane::with_mouse_reporting(
        history_pane(&entries, 3),
        TextEditor::new(""),
        Theme::default(),
        frame_requester(),
        Box::new(sink.clone()),
    )
    .expect("mouse reporting");
    pane.set_terminal_rows(20);
    pane.render(60);
    (pane, done)
}

#[tokio::test]
async fn construction_enables_button_and_sgr_reporting() {
    let sink = TerminalSink::default();
    let (pane, _done) = mouse_pane(&sink);
    assert!(pane.mouse_reporting_enabled());
    assert_eq!(sink.contents(), "\x1b[?1000h\x1b[?1006h");
}

#[tokio::test]
async fn wheel_down_scrolls_three_lines() {
    let sink = TerminalSink::default();
    let (mut pane, _done) = mouse_pane(&sink);
    pane.handle_input("g");
    assert_eq!(pane.history().scroll_offset(), 0);

    pane.handle_input("\x1b[<65;10;4M");
    assert_eq!(pane.history().scroll_offset(), 3);

    pane.handle_input("\x1b[<64;10;4M");
    assert_eq!(pane.history().scroll_offset(), 0);
    pane.handle_input("\x1b[<64;10;4M");
    assert_eq!(pane.history().scroll_offset(), 0);
}

#[tokio::test]
async fn wheel_works_while_the_editor_has_focus() {
    let sink = TerminalSink::default();
    let (mut pane, _done) = mouse_pane(&sink);
    let bottom = pane.history().scroll_offset();
    pane.set_focus(Focus::Editor);

    pane.handle_input("\x1b[<64;1;1M");
    assert_eq!(pane.history().scroll_offset(), bottom - 3);
    assert_eq!(pane.editor().text(), "");
}

#[tokio::test]
async fn coalesced_wheel_reports_each_scroll() {
    let sink = TerminalSink::default();
    let (mut pane, _done) = mouse_pane(&sink);
    let bottom = pane.history().scroll_offset();

    pane.handle_input("\x1b[<64;10;4M\x1b[<64;10;4M");
    assert_eq!(pane.history().scroll_offset(), bottom - 6);

    pane.set_focus(Focus::Editor);
    pane.handle_input("\x1b[<65;10;4M\x1b[<65;10;4M");
    assert_eq!(pane.history().scroll_offset(), bottom);
    assert_eq!(pane.editor().text(), "");
}

#[tokio::test]
async fn other_buttons_are_ignored() {
    let sink = TerminalSink::default();
    let (mut pane, mut done) = mouse_pane(&sink);
    let offset = pane.history().scroll_offset();

    pane.handle_input("\x1b[<0;5;5M");
    pane.handle_input("\x1b[<0;5;5m");
    assert_eq!(pane.history().scroll_offset(), offset);
    assert_eq!(done.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn malformed_mouse_input_falls_through_to_keys() {
    let sink = TerminalSink::default();
    let (mut pane, mut done) = mouse_pane(&sink);
    pane.handle_input("\x1b[<65;10M");
    assert_eq!(done.try_recv(), Err(TryRecvError::Empty));
    pane.handle_input("q");
    assert_eq!(done.try_recv(), Ok(String::new()));
    assert!(sink.contents().ends_with("\x1b[?1000l\x1b[?1006l"));
}
