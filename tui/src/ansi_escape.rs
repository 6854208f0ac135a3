use ansi_to_tui::IntoText;
use ratatui::text::Line;
use ratatui::text::Text;

/// Tabs confuse width accounting once output is laid out in cells.
fn expand_tabs(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains('\t') {
        std::borrow::Cow::Owned(s.replace('\t', "    "))
    } else {
        std::borrow::Cow::Borrowed(s)
    }
}

/// Parse SGR-coloured command output into styled text.
///
/// Output that `ansi-to-tui` rejects is shown as plain text with control characters removed.
pub(crate) fn ansi_escape(s: &str) -> Text<'static> {
    let s = expand_tabs(s);
    match s.as_ref().into_text() {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("failed to parse ANSI output: {err}");
            let plain: String = s
                .chars()
                .filter(|c| *c == '\n' || !c.is_control())
                .collect();
            Text::from(plain)
        }
    }
}

/// Like [`ansi_escape`] for a string expected to hold a single line.
pub(crate) fn ansi_escape_line(s: &str) -> Line<'static> {
    let text = ansi_escape(s);
    match text.lines.as_slice() {
        [] => Line::from(""),
        [only] => only.clone(),
        [first, rest @ ..] => {
            tracing::debug!(extra = rest.len(), "ansi_escape_line: dropping trailing lines");
            first.clone()
        }
    }
}
