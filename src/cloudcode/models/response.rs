//! Messages API response types.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;
use super::request::Role;

/// Response body of a non-streaming `POST /v1/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagesResponse {
    /// `msg_` followed by 32 hex characters.
    pub id: String,

    /// Always "message".
    #[serde(rename = "type", default = "default_message_type")]
    pub response_type: String,

    pub role: Role,

    /// The model name the client asked for, not the backend id.
    pub model: String,

    /// Never empty.
    pub content: Vec<ContentBlock>,

    pub stop_reason: Option<StopReason>,

    /// Always null; the backend does not report which stop sequence fired.
    pub stop_sequence: Option<String>,

    pub usage: Usage,
}

fn default_message_type() -> String {
    "message".to_string()
}

impl MessagesResponse {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        content: Vec<ContentBlock>,
        stop_reason: Option<StopReason>,
        usage: Usage,
    ) -> Self {
        Self {
            id: id.into(),
            response_type: default_message_type(),
            role: Role::Assistant,
            model: model.into(),
            content,
            stop_reason,
            stop_sequence: None,
            usage,
        }
    }

    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn has_tool_calls(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::ToolUse => write!(f, "tool_use"),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}
