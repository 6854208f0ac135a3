//! Scrollable, cached view over a conversation snapshot.
//!
//! Entries are expanded once, at construction, into an ordered list of render descriptors. Each
//! descriptor owns the payload for one display cell plus a slot holding the lines that cell
//! produced at the last materialized width. Materialization is the only expensive step and only
//! happens when the width changes or after [`HistoryPane::invalidate`]; every other render is a
//! slice over the cached lines.

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

use crate::conversation::AssistantMessage;
use crate::conversation::BashExecution;
use crate::conversation::BranchSummary;
use crate::conversation::CompactionSummary;
use crate::conversation::ConversationEntry;
use crate::conversation::CustomMessage;
use crate::conversation::SkillBlock;
use crate::conversation::ToolCall;
use crate::conversation::ToolResultMessage;
use crate::conversation::parse_skill_block;
use crate::history_cell::HistoryCell;
use crate::history_cell::ToolOutcome;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::key_hint::decode_key;
use crate::line_truncation::truncate_line_to_width;
use crate::render::line_utils::blank_line;
use crate::render::line_utils::pad_to_width;
use crate::render::line_utils::rule_line;
use crate::style::BorderTone;
use crate::style::Theme;
use crate::tui::FrameRequester;

/// Placeholder shown when there is nothing to scroll through.
pub const NO_MESSAGES: &str = "No messages yet";

const SCROLL_HINT: &str = "j/k scroll · J/K page · g/G jump · tab focus · q close";

/// Rows below the content: the separator and the position indicator.
const CHROME_ROWS: u16 = 2;

const LINE_UP: [KeyBinding; 2] = [
    key_hint::plain(KeyCode::Up),
    key_hint::plain(KeyCode::Char('k')),
];
const LINE_DOWN: [KeyBinding; 2] = [
    key_hint::plain(KeyCode::Down),
    key_hint::plain(KeyCode::Char('j')),
];
const PAGE_UP: [KeyBinding; 2] = [
    key_hint::plain(KeyCode::PageUp),
    key_hint::plain(KeyCode::Char('K')),
];
const PAGE_DOWN: [KeyBinding; 2] = [
    key_hint::plain(KeyCode::PageDown),
    key_hint::plain(KeyCode::Char('J')),
];
const JUMP_TOP: KeyBinding = key_hint::plain(KeyCode::Char('g'));
const JUMP_BOTTOM: KeyBinding = key_hint::plain(KeyCode::Char('G'));

/// Presentation settings shared by every cell in the pane.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    pub theme: Theme,
    pub tools_expanded: bool,
    pub hide_thinking: bool,
    pub cwd: Option<PathBuf>,
}

/// Payload for one display cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DescriptorKind {
    Spacer { height: usize },
    User { text: String, images: Vec<String> },
    Skill(SkillBlock),
    Assistant(AssistantMessage),
    ToolCall {
        call: ToolCall,
        outcome: Option<ToolOutcome>,
    },
    Shell(BashExecution),
    Compaction(CompactionSummary),
    Branch(BranchSummary),
    Custom(CustomMessage),
}

impl DescriptorKind {
    /// Build the display cell for this descriptor, seeded with the pane's expand state.
    fn cell<'a>(&'a self, options: &'a HistoryOptions) -> HistoryCell<'a> {
        let expanded = false;
        let mut cell = match self {
            DescriptorKind::Spacer { height } => HistoryCell::Spacer { height: *height },
            DescriptorKind::User { text, images } => HistoryCell::User { text, images },
            DescriptorKind::Skill(skill) => HistoryCell::UserSkill { skill, expanded },
            DescriptorKind::Assistant(message) => HistoryCell::Assistant {
                message,
                hide_thinking: options.hide_thinking,
            },
            DescriptorKind::ToolCall { call, outcome } => HistoryCell::Tool {
                call,
                outcome: outcome.as_ref(),
                expanded,
                cwd: options.cwd.as_deref(),
            },
            DescriptorKind::Shell(exec) => HistoryCell::Shell { exec, expanded },
            DescriptorKind::Compaction(summary) => HistoryCell::Compaction { summary, expanded },
            DescriptorKind::Branch(summary) => HistoryCell::Branch { summary },
            DescriptorKind::Custom(message) => HistoryCell::Custom { message },
        };
        cell.set_expanded(options.tools_expanded);
        cell
    }
}

#[derive(Debug)]
struct RenderDescriptor {
    kind: DescriptorKind,
    /// Lines at the pane's `last_width`; `None` until materialized.
    cached: Option<Vec<Line<'static>>>,
}

/// Expand entries into descriptors, in entry order.
pub(crate) fn build_descriptors(entries: &[ConversationEntry]) -> Vec<DescriptorKind> {
    let results: HashMap<&str, &ToolResultMessage> = entries
        .iter()
        .filter_map(|entry| match entry {
            ConversationEntry::ToolResult(result) => Some((result.tool_call_id.as_str(), result)),
            _ => None,
        })
        .collect();

    let mut out = Vec::new();
    for entry in entries {
        match entry {
            ConversationEntry::User(message) => {
                let text = message.content.text();
                let images: Vec<String> = message
                    .content
                    .image_mime_types()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                match parse_skill_block(&text) {
                    Some(skill) => {
                        let user_text = skill.user_text.clone();
                        out.push(DescriptorKind::Spacer { height: 1 });
                        out.push(DescriptorKind::Skill(skill));
                        if let Some(text) = user_text {
                            out.push(DescriptorKind::User { text, images });
                        }
                    }
                    None => out.push(DescriptorKind::User { text, images }),
                }
            }
            ConversationEntry::Assistant(message) => {
                out.push(DescriptorKind::Assistant(message.clone()));
                let failure = message.failure_text();
                for call in message.tool_calls() {
                    let outcome = results
                        .get(call.id.as_str())
                        .map(|result| ToolOutcome {
                            text: result.text(),
                            is_error: result.is_error,
                        })
                        .or_else(|| {
                            failure.clone().map(|text| ToolOutcome {
                                text,
                                is_error: true,
                            })
                        });
                    out.push(DescriptorKind::ToolCall {
                        call: call.clone(),
                        outcome,
                    });
                }
            }
            ConversationEntry::ToolResult(_) => {}
            ConversationEntry::BashExecution(exec) => out.push(DescriptorKind::Shell(exec.clone())),
            ConversationEntry::CompactionSummary(summary) => {
                out.push(DescriptorKind::Compaction(summary.clone()));
            }
            ConversationEntry::BranchSummary(summary) => {
                out.push(DescriptorKind::Branch(summary.clone()));
            }
            ConversationEntry::Custom(message) if message.display => {
                out.push(DescriptorKind::Custom(message.clone()));
            }
            ConversationEntry::Custom(_) => {}
        }
    }
    out
}

/// Whether `data` is one of the keys the history pane scrolls with.
pub fn is_navigation_key(data: &str) -> bool {
    let Some(key) = decode_key(data) else {
        return false;
    };
    LINE_UP
        .iter()
        .chain(LINE_DOWN.iter())
        .chain(PAGE_UP.iter())
        .chain(PAGE_DOWN.iter())
        .chain([JUMP_TOP, JUMP_BOTTOM].iter())
        .any(|binding| binding.is_press(key))
}

pub struct HistoryPane {
    descriptors: Vec<RenderDescriptor>,
    options: HistoryOptions,
    frame_requester: FrameRequester,
    scroll_offset: usize,
    viewport_height: u16,
    total_lines: usize,
    last_width: Option<u16>,
    scrolled_to_latest: bool,
    focused: bool,
    materializations: usize,
}

impl HistoryPane {
    pub fn new(
        entries: &[ConversationEntry],
        options: HistoryOptions,
        frame_requester: FrameRequester,
    ) -> Self {
        let descriptors: Vec<RenderDescriptor> = build_descriptors(entries)
            .into_iter()
            .map(|kind| RenderDescriptor { kind, cached: None })
            .collect();
        tracing::debug!(
            entries = entries.len(),
            descriptors = descriptors.len(),
            "built history descriptors"
        );
        Self {
            descriptors,
            options,
            frame_requester,
            scroll_offset: 0,
            viewport_height: CHROME_ROWS + 1,
            total_lines: 0,
            last_width: None,
            scrolled_to_latest: false,
            focused: true,
            materializations: 0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    /// Separator tone follows focus.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.options.theme = theme;
        self.invalidate();
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn content_height(&self) -> usize {
        usize::from(self.viewport_height.saturating_sub(CHROME_ROWS))
    }

    pub fn max_scroll_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.content_height())
    }

    /// How many times the cells have been rebuilt from scratch.
    pub fn materialization_count(&self) -> usize {
        self.materializations
    }

    /// Drop every cached line; the next render rebuilds all cells.
    pub fn invalidate(&mut self) {
        for descriptor in &mut self.descriptors {
            descriptor.cached = None;
        }
        self.last_width = None;
        self.total_lines = 0;
    }

    fn ensure_materialized(&mut self, width: u16) {
        if self.last_width == Some(width) {
            return;
        }
        let options = &self.options;
        let mut total = 0usize;
        for descriptor in &mut self.descriptors {
            let lines: Vec<Line<'static>> = descriptor
                .kind
                .cell(options)
                .display_lines(width, &options.theme)
                .into_iter()
                .map(|line| truncate_line_to_width(line, usize::from(width)))
                .collect();
            total += lines.len();
            descriptor.cached = Some(lines);
        }
        self.total_lines = total;
        self.last_width = Some(width);
        self.materializations += 1;
        tracing::debug!(width, total_lines = total, "materialized history cells");
    }

    /// Produce exactly `viewport_height` lines for the current scroll position.
    pub fn render(&mut self, width: u16) -> Vec<Line<'static>> {
        self.ensure_materialized(width);
        if !self.scrolled_to_latest && self.total_lines > 0 {
            self.scroll_offset = self.max_scroll_offset();
            self.scrolled_to_latest = true;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());

        let height = usize::from(self.viewport_height);
        if self.total_lines == 0 {
            let placeholder = Line::from(Span::styled(NO_MESSAGES, self.options.theme.muted));
            let mut lines = vec![truncate_line_to_width(placeholder, usize::from(width))];
            lines.resize_with(height.max(1), || blank_line(width));
            lines.truncate(height);
            return lines;
        }

        let content_height = self.content_height();
        let mut lines: Vec<Line<'static>> = self
            .descriptors
            .iter()
            .filter_map(|descriptor| descriptor.cached.as_ref())
            .flatten()
            .skip(self.scroll_offset)
            .take(content_height)
            .cloned()
            .collect();
        lines.resize_with(content_height, || blank_line(width));

        let tone = BorderTone::for_focus(self.focused);
        lines.push(rule_line(width, tone.resolve(&self.options.theme)));
        lines.push(self.indicator_line(width));
        lines.truncate(height);
        lines
    }

    fn indicator_line(&self, width: u16) -> Line<'static> {
        let theme = &self.options.theme;
        let width = usize::from(width);
        let left = format!("Line {}/{}", self.scroll_offset + 1, self.total_lines);
        let left_width = left.width();
        let right_width = SCROLL_HINT.width();
        let line = if left_width + right_width + 4 <= width {
            let gap = " ".repeat(width - left_width - right_width);
            Line::from(vec![
                Span::styled(left, theme.muted),
                Span::raw(gap),
                Span::styled(SCROLL_HINT, theme.dim),
            ])
        } else {
            Line::from(Span::styled(pad_to_width(&left, width), theme.muted))
        };
        truncate_line_to_width(line, width)
    }

    /// Half the content area, rounded down.
    fn page_step(&self) -> usize {
        self.content_height() / 2
    }

    fn scroll_to(&mut self, offset: usize) {
        self.scroll_offset = offset.min(self.max_scroll_offset());
        self.frame_requester.schedule_frame();
    }

    /// Apply one navigation key. Returns `false` when `data` is not a navigation key.
    pub fn handle_input(&mut self, data: &str) -> bool {
        let Some(key) = decode_key(data) else {
            return false;
        };
        let offset = self.scroll_offset;
        if LINE_UP.iter().any(|b| b.is_press(key)) {
            self.scroll_to(offset.saturating_sub(1));
        } else if LINE_DOWN.iter().any(|b| b.is_press(key)) {
            self.scroll_to(offset.saturating_add(1));
        } else if PAGE_UP.iter().any(|b| b.is_press(key)) {
            self.scroll_to(offset.saturating_sub(self.page_step()));
        } else if PAGE_DOWN.iter().any(|b| b.is_press(key)) {
            self.scroll_to(offset.saturating_add(self.page_step()));
        } else if JUMP_TOP.is_press(key) {
            self.scroll_to(0);
        } else if JUMP_BOTTOM.is_press(key) {
            self.scroll_to(self.max_scroll_offset());
        } else {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ContentBlock;
    use crate::conversation::MessageContent;
    use crate::conversation::StopReason;
    use crate::conversation::UserMessage;
    use crate::render::line_utils::line_to_plain_string;
    use pretty_assertions::assert_eq;

    fn note(i: usize) -> ConversationEntry {
        ConversationEntry::Custom(CustomMessage {
            custom_type: "n".to_string(),
            content: MessageContent::Text(format!("{i}")),
            display: true,
        })
    }

    fn pane_with(count: usize, height: u16) -> HistoryPane {
        let entries: Vec<ConversationEntry> = (0..count).map(note).collect();
        let mut pane = HistoryPane::new(
            &entries,
            HistoryOptions::default(),
            FrameRequester::test_dummy(),
        );
        pane.set_viewport_height(height);
        pane
    }

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines.iter().map(line_to_plain_string).collect()
    }

    #[test]
    fn first_render_shows_latest_lines() {
        let mut pane = pane_with(20, 7);
        let lines = plain(&pane.render(40));
        assert_eq!(pane.scroll_offset(), 15);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "• [n] 15");
        assert_eq!(lines[4], "• [n] 19");
        assert_eq!(lines[5], "─".repeat(40));
        assert_eq!(lines[6], format!("{:<40}", "Line 16/20"));
    }

    #[test]
    fn short_history_is_padded_with_blank_rows() {
        let mut pane = pane_with(2, 6);
        let lines = plain(&pane.render(10));
        assert_eq!(pane.scroll_offset(), 0);
        assert_eq!(
            lines,
            vec![
                "• [n] 0".to_string(),
                "• [n] 1".to_string(),
                " ".repeat(10),
                " ".repeat(10),
                "─".repeat(10),
                format!("{:<10}", "Line 1/2"),
            ]
        );
    }

    #[test]
    fn indicator_includes_hint_when_wide_enough() {
        let mut pane = pane_with(3, 5);
        let lines = plain(&pane.render(80));
        let indicator = &lines[4];
        assert!(indicator.starts_with("Line 1/3"));
        assert!(indicator.ends_with(SCROLL_HINT));
        assert_eq!(indicator.width(), 80);
    }

    #[test]
    fn page_keys_move_by_half_the_content_height() {
        let mut pane = pane_with(50, 12);
        pane.render(40);
        assert_eq!(pane.scroll_offset(), 40);
        assert!(pane.handle_input("K"));
        assert_eq!(pane.scroll_offset(), 35);
        assert!(pane.handle_input("\x1b[5~"));
        assert_eq!(pane.scroll_offset(), 30);
        assert!(pane.handle_input("J"));
        assert!(pane.handle_input("\x1b[6~"));
        assert_eq!(pane.scroll_offset(), 40);
        assert!(pane.handle_input("J"));
        assert_eq!(pane.scroll_offset(), 40);
    }

    #[test]
    fn every_scroll_requests_a_frame() {
        let entries: Vec<ConversationEntry> = (0..30).map(note).collect();
        let (requester, mut rx) = FrameRequester::test_with_receiver();
        let mut pane = HistoryPane::new(&entries, HistoryOptions::default(), requester);
        pane.set_viewport_height(10);
        pane.render(40);

        pane.handle_input("k");
        pane.handle_input("g");
        assert!(!pane.handle_input("x"));

        let mut frames = 0;
        while rx.try_recv().is_ok() {
            frames += 1;
        }
        assert_eq!(frames, 2);
    }

    #[test]
    fn tool_calls_follow_their_assistant_turn() {
        let entries = vec![
            ConversationEntry::User(UserMessage {
                content: MessageContent::Text("go".to_string()),
            }),
            ConversationEntry::Assistant(AssistantMessage {
                content: vec![
                    ContentBlock::ToolCall(ToolCall {
                        id: "a".to_string(),
                        name: "read".to_string(),
                        arguments: serde_json::Value::Null,
                    }),
                    ContentBlock::ToolCall(ToolCall {
                        id: "b".to_string(),
                        name: "write".to_string(),
                        arguments: serde_json::Value::Null,
                    }),
                ],
                stop_reason: StopReason::Aborted,
                error_message: None,
            }),
            ConversationEntry::ToolResult(ToolResultMessage {
                tool_call_id: "a".to_string(),
                tool_name: "read".to_string(),
                content: vec![ContentBlock::Text {
                    text: "ok".to_string(),
                }],
                is_error: false,
            }),
        ];
        let kinds = build_descriptors(&entries);
        assert_eq!(kinds.len(), 4);
        let outcomes: Vec<Option<ToolOutcome>> = kinds
            .iter()
            .filter_map(|kind| match kind {
                DescriptorKind::ToolCall { outcome, .. } => Some(outcome.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                Some(ToolOutcome {
                    text: "ok".to_string(),
                    is_error: false,
                }),
                Some(ToolOutcome {
                    text: "Operation aborted".to_string(),
                    is_error: true,
                }),
            ]
        );
    }

    #[test]
    fn skill_invocation_expands_to_spacer_skill_and_user_text() {
        let entries = vec![ConversationEntry::User(UserMessage {
            content: MessageContent::Text(
                "<skill name=\"s\" location=\"/s.md\">\nbody\n</skill>\n\nand then".to_string(),
            ),
        })];
        let kinds = build_descriptors(&entries);
        assert!(matches!(kinds[0], DescriptorKind::Spacer { height: 1 }));
        assert!(matches!(kinds[1], DescriptorKind::Skill(_)));
        assert!(matches!(
            &kinds[2],
            DescriptorKind::User { text, .. } if text == "and then"
        ));
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn hidden_custom_entries_produce_nothing() {
        let entries = vec![ConversationEntry::Custom(CustomMessage {
            custom_type: "state".to_string(),
            content: MessageContent::Text("x".to_string()),
            display: false,
        })];
        assert!(build_descriptors(&entries).is_empty());
    }

    #[test]
    fn set_theme_forces_rebuild() {
        let mut pane = pane_with(5, 6);
        pane.render(30);
        pane.render(30);
        assert_eq!(pane.materialization_count(), 1);
        pane.set_theme(Theme::light());
        pane.render(30);
        assert_eq!(pane.materialization_count(), 2);
    }

    #[test]
    fn cached_lines_never_exceed_width() {
        let entries = vec![ConversationEntry::BashExecution(BashExecution {
            command: "echo a-very-long-command-line-that-overflows".to_string(),
            output: "x".repeat(200),
            exit_code: Some(0),
            cancelled: false,
            truncated: false,
            full_output_path: None,
        })];
        let mut pane = HistoryPane::new(
            &entries,
            HistoryOptions::default(),
            FrameRequester::test_dummy(),
        );
        pane.set_viewport_height(8);
        for line in pane.render(16) {
            assert!(line.width() <= 16, "line too wide: {line:?}");
        }
    }
}
