use std::io::Write;

use history_split_tui::HistoryOptions;
use history_split_tui::HistoryPane;
use history_split_tui::error::SessionError;
use history_split_tui::line_to_plain_string;
use history_split_tui::load_session;
use pretty_assertions::assert_eq;

use super::support::frame_requester;

const SESSION: &str = r#"{"role":"user","content":"list the files"}
{"role":"assistant","content":[{"type":"thinking","thinking":"use ls"},{"type":"toolCall","id":"t1","name":"bash","arguments":{"command":"ls"}}],"stopReason":"toolUse"}
{"role":"toolResult","toolCallId":"t1","toolName":"bash","content":[{"type":"text","text":"Cargo.toml\nsrc"}],"isError":false}
{"role":"assistant","content":[{"type":"text","text":"Two entries."}],"stopReason":"stop"}
{"role":"custom","customType":"hidden","content":"internal","display":false}
"#;

#[tokio::test]
async fn loads_and_renders_a_recorded_session() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(SESSION.as_bytes())?;

    let entries = load_session(file.path())?;
    assert_eq!(entries.len(), 5);

    let options = HistoryOptions {
        hide_thinking: true,
        ..HistoryOptions::default()
    };
    let mut pane = HistoryPane::new(&entries, options, frame_requester());
    pane.set_viewport_height(40);
    let text: Vec<String> = pane
        .render(60)
        .iter()
        .map(line_to_plain_string)
        .collect();

    assert!(text.iter().any(|l| l == "› list the files"));
    assert!(text.iter().any(|l| l == "  Thinking…"));
    assert!(text.iter().any(|l| l == "• Called bash ls"));
    assert!(text.iter().any(|l| l == "  └ Cargo.toml"));
    assert!(text.iter().any(|l| l == "• Two entries."));
    assert!(!text.iter().any(|l| l.contains("internal")));
    Ok(())
}

#[test]
fn bad_line_is_reported_with_its_number() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, r#"{{"role":"user","content":"ok"}}"#)?;
    writeln!(file, r#"{{"role":"narrator","content":"?"}}"#)?;

    match load_session(file.path()) {
        Err(SessionError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = load_session(&dir.path().join("absent.jsonl"));
    assert!(matches!(result, Err(SessionError::Io { .. })));
}
