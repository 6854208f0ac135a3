//! The editor pane.
//!
//! The split pane only talks to its editor through the [`Editor`] trait; [`TextEditor`] is the
//! implementation the binary ships with.

use crossterm::event::KeyCode;
use crossterm::event::KeyModifiers;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::key_hint::decode_key;

/// What an editor reports back after consuming one input chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    None,
    Submitted(String),
    Escaped,
}

/// An editing surface that owns its own borders and decides its own height.
pub trait Editor {
    fn render(&mut self, width: u16) -> Vec<Line<'static>>;

    fn handle_input(&mut self, data: &str) -> EditorEvent;

    fn text(&self) -> String;

    fn set_text(&mut self, text: &str);

    fn set_border_style(&mut self, style: Style);

    fn invalidate(&mut self);
}

const SUBMIT: KeyBinding = key_hint::plain(KeyCode::Enter);
const ESCAPE: KeyBinding = key_hint::plain(KeyCode::Esc);
const NEWLINE: [KeyBinding; 2] = [
    key_hint::shift(KeyCode::Enter),
    key_hint::alt(KeyCode::Enter),
];

/// Border plus one padding column on each side.
const FRAME_COLS: usize = 4;

/// Multi-line text input with a grapheme-aware cursor.
#[derive(Debug, Default)]
pub struct TextEditor {
    text: String,
    /// Byte offset into `text`, always on a grapheme boundary.
    cursor: usize,
    border_style: Style,
    cache: Option<(u16, Vec<Line<'static>>)>,
}

impl TextEditor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
            border_style: Style::default(),
            cache: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.cache = None;
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len())
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor].rfind('\n').map_or(0, |idx| idx + 1)
    }

    fn line_end(&self) -> usize {
        self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |idx| self.cursor + idx)
    }

    fn move_to(&mut self, cursor: usize) {
        if cursor != self.cursor {
            self.cursor = cursor;
            self.cache = None;
        }
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        if start < end {
            self.text.replace_range(start..end, "");
            self.cursor = start;
            self.cache = None;
        }
    }

    /// Wrap the text into rows of at most `inner` columns, marking the cursor cell.
    fn content_rows(&self, inner: usize) -> Vec<Line<'static>> {
        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
        let mut rows: Vec<Line<'static>> = Vec::new();
        let mut line_offset = 0usize;
        for logical in self.text.split('\n') {
            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut pending = String::new();
            let mut used = 0usize;
            for (idx, grapheme) in logical.grapheme_indices(true) {
                let grapheme_width = grapheme.width();
                if used > 0 && used + grapheme_width > inner {
                    flush(&mut pending, &mut spans);
                    rows.push(Line::from(std::mem::take(&mut spans)));
                    used = 0;
                }
                if line_offset + idx == self.cursor {
                    flush(&mut pending, &mut spans);
                    spans.push(Span::styled(grapheme.to_string(), cursor_style));
                } else {
                    pending.push_str(grapheme);
                }
                used += grapheme_width;
            }
            flush(&mut pending, &mut spans);
            if self.cursor == line_offset + logical.len() {
                if used > 0 && used + 1 > inner {
                    rows.push(Line::from(std::mem::take(&mut spans)));
                }
                spans.push(Span::styled(" ", cursor_style));
            }
            rows.push(Line::from(spans));
            line_offset += logical.len() + 1;
        }
        rows
    }
}

fn flush(pending: &mut String, spans: &mut Vec<Span<'static>>) {
    if !pending.is_empty() {
        spans.push(Span::raw(std::mem::take(pending)));
    }
}

impl Editor for TextEditor {
    fn render(&mut self, width: u16) -> Vec<Line<'static>> {
        if let Some((cached_width, lines)) = &self.cache
            && *cached_width == width
        {
            return lines.clone();
        }

        let total = usize::from(width).max(FRAME_COLS + 1);
        let inner = total - FRAME_COLS;
        let border = self.border_style;
        let horizontal = "─".repeat(total - 2);

        let mut lines = vec![Line::from(Span::styled(format!("╭{horizontal}╮"), border))];
        for row in self.content_rows(inner) {
            let pad = inner.saturating_sub(row.width());
            let mut spans = vec![Span::styled("│ ", border)];
            spans.extend(row.spans);
            spans.push(Span::raw(" ".repeat(pad)));
            spans.push(Span::styled(" │", border));
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(Span::styled(format!("╰{horizontal}╯"), border)));

        self.cache = Some((width, lines.clone()));
        lines
    }

    fn handle_input(&mut self, data: &str) -> EditorEvent {
        let Some(key) = decode_key(data) else {
            // Not a single key: treat printable input as a paste, drop unknown sequences.
            if data.starts_with('\x1b') {
                return EditorEvent::None;
            }
            let normalized = data.replace("\r\n", "\n").replace('\r', "\n");
            let pasted: String = normalized
                .chars()
                .filter(|c| *c == '\n' || !c.is_control())
                .collect();
            if !pasted.is_empty() {
                self.insert_str(&pasted);
            }
            return EditorEvent::None;
        };

        if SUBMIT.is_press(key) {
            return EditorEvent::Submitted(self.text.clone());
        }
        if ESCAPE.is_press(key) {
            return EditorEvent::Escaped;
        }
        if NEWLINE.iter().any(|binding| binding.is_press(key)) {
            self.insert_str("\n");
            return EditorEvent::None;
        }
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::NONE) => {
                let start = self.prev_boundary();
                self.delete_range(start, self.cursor);
            }
            (KeyCode::Delete, KeyModifiers::NONE) => {
                let end = self.next_boundary();
                self.delete_range(self.cursor, end);
            }
            (KeyCode::Left, KeyModifiers::NONE) => self.move_to(self.prev_boundary()),
            (KeyCode::Right, KeyModifiers::NONE) => self.move_to(self.next_boundary()),
            (KeyCode::Home, KeyModifiers::NONE) => self.move_to(self.line_start()),
            (KeyCode::End, KeyModifiers::NONE) => self.move_to(self.line_end()),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf));
            }
            _ => {}
        }
        EditorEvent::None
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
        self.cache = None;
    }

    fn set_border_style(&mut self, style: Style) {
        if self.border_style != style {
            self.border_style = style;
            self.cache = None;
        }
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }
}
