//! Display components for conversation entries.
//!
//! A [`HistoryCell`] turns one render descriptor into styled lines at a given width. The set of
//! cell kinds is closed: every descriptor the history pane produces maps onto exactly one variant.
//! Cells borrow their payload from the descriptor, so building one is cheap; producing its lines
//! (wrapping, ANSI parsing) is the expensive part and is cached by the pane.

use std::path::Path;

use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use serde_json::Value;

use crate::ansi_escape::ansi_escape_line;
use crate::conversation::AssistantMessage;
use crate::conversation::BashExecution;
use crate::conversation::BranchSummary;
use crate::conversation::CompactionSummary;
use crate::conversation::ContentBlock;
use crate::conversation::CustomMessage;
use crate::conversation::SkillBlock;
use crate::conversation::ToolCall;
use crate::line_truncation::truncate_line_with_ellipsis_if_overflow;
use crate::render::line_utils::prefix_lines;
use crate::style::Theme;
use crate::wrapping::RtOptions;
use crate::wrapping::word_wrap_lines;

/// Output rows shown for a collapsed tool or shell block.
pub(crate) const TOOL_CALL_MAX_LINES: usize = 5;

/// The result a tool call ended with: either its recorded result or a synthesized failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HistoryCell<'a> {
    Spacer {
        height: usize,
    },
    User {
        text: &'a str,
        images: &'a [String],
    },
    UserSkill {
        skill: &'a SkillBlock,
        expanded: bool,
    },
    Assistant {
        message: &'a AssistantMessage,
        hide_thinking: bool,
    },
    Tool {
        call: &'a ToolCall,
        outcome: Option<&'a ToolOutcome>,
        expanded: bool,
        cwd: Option<&'a Path>,
    },
    Shell {
        exec: &'a BashExecution,
        expanded: bool,
    },
    Compaction {
        summary: &'a CompactionSummary,
        expanded: bool,
    },
    Branch {
        summary: &'a BranchSummary,
    },
    Custom {
        message: &'a CustomMessage,
    },
}

impl HistoryCell<'_> {
    /// Expand or collapse cells that support it. Other kinds ignore the call.
    pub(crate) fn set_expanded(&mut self, value: bool) {
        match self {
            HistoryCell::UserSkill { expanded, .. }
            | HistoryCell::Tool { expanded, .. }
            | HistoryCell::Shell { expanded, .. }
            | HistoryCell::Compaction { expanded, .. } => *expanded = value,
            HistoryCell::Spacer { .. }
            | HistoryCell::User { .. }
            | HistoryCell::Assistant { .. }
            | HistoryCell::Branch { .. }
            | HistoryCell::Custom { .. } => {}
        }
    }

    pub(crate) fn display_lines(&self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        let width = usize::from(width).max(1);
        match self {
            HistoryCell::Spacer { height } => vec![Line::from(""); *height],
            HistoryCell::User { text, images } => user_lines(text, images, width, theme),
            HistoryCell::UserSkill { skill, expanded } => {
                skill_lines(skill, *expanded, width, theme)
            }
            HistoryCell::Assistant {
                message,
                hide_thinking,
            } => assistant_lines(message, *hide_thinking, width, theme),
            HistoryCell::Tool {
                call,
                outcome,
                expanded,
                cwd,
            } => tool_lines(call, *outcome, *expanded, *cwd, width, theme),
            HistoryCell::Shell { exec, expanded } => shell_lines(exec, *expanded, width, theme),
            HistoryCell::Compaction { summary, expanded } => {
                let mut lines = vec![Line::from("")];
                lines.push(Line::from(vec![
                    Span::styled("• ", theme.accent),
                    format!("Compacted {} tokens", summary.tokens_before).bold(),
                ]));
                if *expanded {
                    lines.extend(indented(&summary.summary, width, theme.dim));
                }
                lines
            }
            HistoryCell::Branch { summary } => {
                let mut lines = vec![Line::from("")];
                lines.push(Line::from(vec![
                    Span::styled("• ", theme.accent),
                    "Branch summary".bold(),
                ]));
                lines.extend(indented(&summary.summary, width, theme.dim));
                lines
            }
            HistoryCell::Custom { message } => {
                let label = format!("[{}] ", message.custom_type);
                let text = message.content.text();
                let mut source = text.split('\n').map(|l| Line::from(l.to_string()));
                let mut first = Line::from(Span::styled(label, theme.accent));
                if let Some(line) = source.next() {
                    first.spans.extend(line.spans);
                }
                word_wrap_lines(
                    std::iter::once(first).chain(source),
                    RtOptions::new(width)
                        .initial_indent(Line::from(Span::styled("• ", theme.muted)))
                        .subsequent_indent(Line::from("  ")),
                )
            }
        }
    }
}

/// Wrap `text` two columns in from the left edge.
fn indented(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    word_wrap_lines(
        text.split('\n').map(|l| Line::from(l.to_string()).style(style)),
        RtOptions::new(width)
            .initial_indent(Line::from("  "))
            .subsequent_indent(Line::from("  ")),
    )
}

fn user_lines(text: &str, images: &[String], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let style = theme.user_message;
    let wrap_width = width.saturating_sub(3).max(1);
    let wrapped = word_wrap_lines(
        text.split('\n').map(|l| Line::from(l.to_string()).style(style)),
        RtOptions::new(wrap_width),
    );

    let mut lines = vec![Line::from("").style(style)];
    lines.extend(prefix_lines(wrapped, "› ".bold().dim(), "  ".into()));
    for mime in images {
        lines.push(Line::from(vec!["  ".into(), format!("[image: {mime}]").dim()]).style(style));
    }
    lines.push(Line::from("").style(style));
    lines
}

fn skill_lines(
    skill: &SkillBlock,
    expanded: bool,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("• ", theme.accent),
        "Skill ".bold(),
        Span::styled(skill.name.clone(), theme.accent),
    ])];
    if expanded {
        lines.extend(indented(&skill.body, width, theme.dim));
        lines.push(Line::from(vec![
            "  ".into(),
            Span::styled(format!("location: {}", skill.location), theme.muted),
        ]));
    } else {
        let count = skill.body.lines().count();
        let noun = if count == 1 { "line" } else { "lines" };
        lines.push(Line::from(vec![
            "  ".into(),
            Span::styled(format!("({count} {noun}, expand to view)"), theme.muted),
        ]));
    }
    lines
}

fn assistant_lines(
    message: &AssistantMessage,
    hide_thinking: bool,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for block in &message.content {
        match block {
            ContentBlock::Text { text } => {
                if text.trim().is_empty() {
                    continue;
                }
                lines.extend(word_wrap_lines(
                    text.split('\n').map(|l| Line::from(l.to_string())),
                    RtOptions::new(width)
                        .initial_indent(Line::from("• ".dim()))
                        .subsequent_indent(Line::from("  ")),
                ));
            }
            ContentBlock::Thinking { .. } if hide_thinking => {
                lines.push(Line::from(vec![
                    "  ".into(),
                    Span::styled("Thinking…", theme.thinking),
                ]));
            }
            ContentBlock::Thinking { thinking } => {
                lines.extend(indented(thinking, width, theme.thinking));
            }
            ContentBlock::Image { mime_type, .. } => {
                lines.push(Line::from(vec!["  ".into(), format!("[image: {mime_type}]").dim()]));
            }
            ContentBlock::ToolCall(_) => {}
        }
    }
    // Tool-call cells carry the failure themselves when the turn had any.
    if message.tool_calls().next().is_none()
        && let Some(failure) = message.failure_text()
    {
        lines.push(Line::from(vec!["  ".into(), Span::styled(failure, theme.error)]));
    }
    lines
}

fn tool_lines(
    call: &ToolCall,
    outcome: Option<&ToolOutcome>,
    expanded: bool,
    cwd: Option<&Path>,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let (verb, bullet_style) = match outcome {
        None => ("Calling", theme.dim),
        Some(ToolOutcome { is_error: true, .. }) => ("Failed", theme.error),
        Some(ToolOutcome { is_error: false, .. }) => ("Called", theme.success),
    };
    let mut header = vec![
        Span::styled("• ", bullet_style),
        format!("{verb} ").bold(),
        Span::styled(call.name.clone(), theme.accent),
    ];
    let summary = argument_summary(&call.arguments, cwd);
    if !summary.is_empty() {
        header.push(" ".into());
        header.push(summary.dim());
    }
    let mut lines = vec![truncate_line_with_ellipsis_if_overflow(Line::from(header), width)];

    let Some(outcome) = outcome else {
        return lines;
    };
    let style = if outcome.is_error { theme.error } else { theme.dim };
    let output: Vec<&str> = outcome.text.lines().collect();
    if output.is_empty() {
        lines.push(Line::from(vec!["  └ ".dim(), "(no output)".dim()]));
        return lines;
    }
    let shown = if expanded {
        output.len()
    } else {
        output.len().min(TOOL_CALL_MAX_LINES)
    };
    for (idx, raw) in output[..shown].iter().enumerate() {
        let prefix = if idx == 0 { "  └ " } else { "    " };
        let line = Line::from(vec![prefix.dim(), Span::styled(raw.to_string(), style)]);
        lines.push(truncate_line_with_ellipsis_if_overflow(line, width));
    }
    let hidden = output.len() - shown;
    if hidden > 0 {
        lines.push(Line::from(format!("    … +{hidden} lines").dim()));
    }
    lines
}

/// One-line description of a tool call's arguments.
fn argument_summary(arguments: &Value, cwd: Option<&Path>) -> String {
    match arguments {
        Value::Null => String::new(),
        Value::Object(map) => {
            for key in ["path", "file_path"] {
                if let Some(Value::String(path)) = map.get(key) {
                    return display_path(path, cwd);
                }
            }
            if let Some(Value::String(command)) = map.get("command") {
                return command.lines().next().unwrap_or_default().to_string();
            }
            if map.is_empty() {
                String::new()
            } else {
                arguments.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Show `path` relative to `cwd` when it lives underneath it.
fn display_path(path: &str, cwd: Option<&Path>) -> String {
    let candidate = Path::new(path);
    match cwd {
        Some(cwd) if candidate.is_absolute() => pathdiff::diff_paths(candidate, cwd)
            .filter(|rel| !rel.starts_with(".."))
            .map(|rel| rel.display().to_string())
            .unwrap_or_else(|| path.to_string()),
        _ => path.to_string(),
    }
}

fn shell_lines(
    exec: &BashExecution,
    expanded: bool,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    let mut command = exec.command.lines();
    let first = command.next().unwrap_or_default();
    lines.push(truncate_line_with_ellipsis_if_overflow(
        Line::from(vec![Span::styled("$ ", theme.accent), first.to_string().bold()]),
        width,
    ));
    for continuation in command {
        lines.push(truncate_line_with_ellipsis_if_overflow(
            Line::from(vec!["  ".into(), continuation.to_string().bold()]),
            width,
        ));
    }

    let output: Vec<&str> = exec.output.lines().collect();
    let skip = if expanded {
        0
    } else {
        output.len().saturating_sub(TOOL_CALL_MAX_LINES)
    };
    if skip > 0 {
        lines.push(Line::from(format!("    … +{skip} earlier lines").dim()));
    }
    for (idx, raw) in output[skip..].iter().enumerate() {
        let prefix = if idx == 0 && skip == 0 { "  └ " } else { "    " };
        let mut line = ansi_escape_line(raw);
        line.spans.insert(0, prefix.dim());
        lines.push(truncate_line_with_ellipsis_if_overflow(line, width));
    }

    if exec.cancelled {
        lines.push(Line::from(vec!["  ".into(), Span::styled("(cancelled)", theme.error)]));
    } else if let Some(code) = exec.exit_code
        && code != 0
    {
        lines.push(Line::from(vec![
            "  ".into(),
            Span::styled(format!("exit {code}"), theme.error),
        ]));
    }
    if exec.truncated {
        let note = match &exec.full_output_path {
            Some(path) => format!("output truncated · full output: {path}"),
            None => "output truncated".to_string(),
        };
        lines.push(truncate_line_with_ellipsis_if_overflow(
            Line::from(vec!["  ".into(), Span::styled(note, theme.muted)]),
            width,
        ));
    }
    lines
}
