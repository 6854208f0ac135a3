use history_split_tui::ConversationEntry;
use history_split_tui::conversation::AssistantMessage;
use history_split_tui::conversation::ContentBlock;
use history_split_tui::conversation::StopReason;
use history_split_tui::history_pane::NO_MESSAGES;
use history_split_tui::line_to_plain_string;
use pretty_assertions::assert_eq;

use super::support::history_pane;
use super::support::one_line_entries;

fn plain(lines: &[ratatui::text::Line<'static>]) -> Vec<String> {
    lines.iter().map(line_to_plain_string).collect()
}

fn long_answer() -> ConversationEntry {
    ConversationEntry::Assistant(AssistantMessage {
        content: vec![ContentBlock::Text {
            text: "word ".repeat(60),
        }],
        stop_reason: StopReason::Stop,
        error_message: None,
    })
}

#[tokio::test]
async fn hundred_lines_in_a_twelve_row_viewport() {
    let entries = one_line_entries(100);
    let mut pane = history_pane(&entries, 12);
    pane.render(80);
    assert_eq!(pane.total_lines(), 100);
    assert_eq!(pane.max_scroll_offset(), 90);
    assert_eq!(pane.scroll_offset(), 90);

    pane.handle_input("g");
    assert_eq!(pane.scroll_offset(), 0);
    pane.handle_input("j");
    assert_eq!(pane.scroll_offset(), 1);

    pane.handle_input("G");
    assert_eq!(pane.scroll_offset(), 90);
    pane.handle_input("k");
    assert_eq!(pane.scroll_offset(), 89);

    let lines = plain(&pane.render(80));
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[0], "• [note] entry 89");
    assert_eq!(lines[9], "• [note] entry 98");
    assert!(lines[11].starts_with("Line 90/100"));
}

#[tokio::test]
async fn scroll_offset_stays_in_bounds() {
    let entries = one_line_entries(25);
    let mut pane = history_pane(&entries, 9);
    pane.render(60);
    let keys = ["j", "J", "G", "j", "\x1b[B", "K", "k", "g", "k", "\x1b[A", "\x1b[6~", "J", "J"];
    for (i, key) in keys.iter().cycle().take(200).enumerate() {
        pane.handle_input(key);
        if i % 7 == 0 {
            pane.render(60);
        }
        assert!(
            pane.scroll_offset() <= pane.max_scroll_offset(),
            "offset {} beyond {} after {key:?}",
            pane.scroll_offset(),
            pane.max_scroll_offset()
        );
    }
}

#[tokio::test]
async fn first_render_shows_the_last_line() {
    let entries = vec![long_answer(), long_answer(), long_answer()];
    let mut pane = history_pane(&entries, 10);
    pane.render(40);
    let content_height = pane.content_height();
    assert_eq!(pane.scroll_offset(), pane.total_lines() - content_height);
}

#[tokio::test]
async fn repeated_render_hits_the_cache() {
    let entries = vec![long_answer(), long_answer()];
    let mut pane = history_pane(&entries, 8);
    let first = pane.render(50);
    let second = pane.render(50);
    assert_eq!(first, second);
    assert_eq!(pane.materialization_count(), 1);
}

#[tokio::test]
async fn width_change_rebuilds_every_cell() {
    let entries = vec![long_answer()];
    let mut pane = history_pane(&entries, 8);
    pane.render(80);
    let wide_total = pane.total_lines();
    pane.render(30);
    assert_eq!(pane.materialization_count(), 2);
    assert!(pane.total_lines() > wide_total);
    for line in pane.render(30) {
        assert!(line.width() <= 30);
    }
}

#[tokio::test]
async fn invalidate_then_render_matches_previous_output() {
    let entries = vec![long_answer(), long_answer()];
    let mut pane = history_pane(&entries, 8);
    let before = pane.render(44);
    pane.invalidate();
    let after = pane.render(44);
    assert_eq!(before, after);
    assert_eq!(pane.materialization_count(), 2);
}

#[tokio::test]
async fn empty_history_shows_placeholder() {
    let mut pane = history_pane(&[], 5);
    let lines = plain(&pane.render(30));
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], NO_MESSAGES);
    assert!(lines[1..].iter().all(|line| line.trim().is_empty()));
}
