use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use history_split_tui::ConversationEntry;
use history_split_tui::FrameRequester;
use history_split_tui::HistoryOptions;
use history_split_tui::HistoryPane;
use history_split_tui::conversation::CustomMessage;
use history_split_tui::conversation::MessageContent;
use tokio::sync::broadcast;

/// A requester backed by a live scheduler whose draws nobody listens to.
/// Must be called inside a tokio runtime.
pub(crate) fn frame_requester() -> FrameRequester {
    let (draw_tx, _draw_rx) = broadcast::channel(4);
    FrameRequester::new(draw_tx)
}

/// `count` entries that each render as exactly one line.
pub(crate) fn one_line_entries(count: usize) -> Vec<ConversationEntry> {
    (0..count)
        .map(|i| {
            ConversationEntry::Custom(CustomMessage {
                custom_type: "note".to_string(),
                content: MessageContent::Text(format!("entry {i}")),
                display: true,
            })
        })
        .collect()
}

pub(crate) fn history_pane(entries: &[ConversationEntry], viewport_height: u16) -> HistoryPane {
    let mut pane = HistoryPane::new(entries, HistoryOptions::default(), frame_requester());
    pane.set_viewport_height(viewport_height);
    pane
}

/// Captures everything written to the terminal.
#[derive(Clone, Default)]
pub(crate) struct TerminalSink(Arc<Mutex<Vec<u8>>>);

impl TerminalSink {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for TerminalSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
