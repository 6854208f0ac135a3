//! The recorded conversation the overlay displays.
//!
//! Sessions are stored as JSONL, one [`ConversationEntry`] per line. The overlay only ever reads
//! them; nothing here mutates or writes a session back.

use std::path::Path;

use lazy_static::lazy_static;
use regex_lite::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SessionError;

lazy_static! {
    static ref SKILL_BLOCK_REGEX: Regex = Regex::new(
        r#"(?s)^<skill name="([^"]*)" location="([^"]*)">\n(.*?)\n</skill>(?:\n\n(.*))?$"#
    )
    .unwrap_or_else(|_| std::process::abort());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum ConversationEntry {
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolResult(ToolResultMessage),
    BashExecution(BashExecution),
    CompactionSummary(CompactionSummary),
    BranchSummary(BranchSummary),
    Custom(CustomMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AssistantMessage {
    /// The line shown under tool calls that never received a result, if the turn ended badly.
    pub fn failure_text(&self) -> Option<String> {
        match self.stop_reason {
            StopReason::Aborted => Some("Operation aborted".to_string()),
            StopReason::Error => Some(format!(
                "Error: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            )),
            StopReason::Stop | StopReason::Length | StopReason::ToolUse => None,
        }
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolCall(call) => Some(call),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    #[default]
    Stop,
    Length,
    ToolUse,
    Error,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultMessage {
    pub tool_call_id: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResultMessage {
    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BashExecution {
    pub command: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_output_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionSummary {
    pub summary: String,
    #[serde(default)]
    pub tokens_before: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub summary: String,
    #[serde(default)]
    pub from_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessage {
    pub custom_type: String,
    pub content: MessageContent,
    #[serde(default)]
    pub display: bool,
}

/// Message bodies are either a bare string or a list of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Text blocks joined by newlines. Images and tool calls are skipped.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks_text(blocks),
        }
    }

    pub fn image_mime_types(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Image { mime_type, .. } => Some(mime_type.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolCall(ToolCall),
    Image {
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(default, skip_serializing)]
        data: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

fn blocks_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A user message that invoked a skill: the expanded skill body plus whatever the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillBlock {
    pub name: String,
    pub location: String,
    pub body: String,
    pub user_text: Option<String>,
}

pub fn parse_skill_block(text: &str) -> Option<SkillBlock> {
    let caps = SKILL_BLOCK_REGEX.captures(text)?;
    let user_text = caps
        .get(4)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(SkillBlock {
        name: caps.get(1)?.as_str().to_string(),
        location: caps.get(2)?.as_str().to_string(),
        body: caps.get(3)?.as_str().to_string(),
        user_text,
    })
}

/// Read a JSONL session file. Blank lines are skipped.
pub fn load_session(path: &Path) -> Result<Vec<ConversationEntry>, SessionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_session(&contents)
}

pub fn parse_session(contents: &str) -> Result<Vec<ConversationEntry>, SessionError> {
    let mut entries = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(raw).map_err(|source| {
            tracing::warn!(line = idx + 1, "unparseable session entry: {source}");
            SessionError::Parse {
                line: idx + 1,
                source,
            }
        })?;
        entries.push(entry);
    }
    tracing::debug!(entries = entries.len(), "parsed session");
    Ok(entries)
}
