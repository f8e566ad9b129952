//! Server-sent event types for streaming Messages API responses.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;
use super::request::Role;
use super::response::{StopReason, Usage};

/// A streaming event.
///
/// Events arrive in a fixed order:
///
/// 1. `MessageStart`
/// 2. per content block: `ContentBlockStart`, `ContentBlockDelta`*, `ContentBlockStop`
/// 3. `MessageDelta`
/// 4. `MessageStop`
///
/// `Error` replaces the remainder of the sequence when the request fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: PartialMessage,
    },

    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },

    ContentBlockDelta {
        index: usize,
        delta: ContentDelta,
    },

    ContentBlockStop {
        index: usize,
    },

    MessageDelta {
        delta: MessageDelta,
        usage: DeltaUsage,
    },

    MessageStop,

    /// Keep-alive event.
    Ping,

    Error {
        error: StreamError,
    },
}

impl StreamEvent {
    pub fn content_block_start(index: usize, content_block: ContentBlock) -> Self {
        StreamEvent::ContentBlockStart {
            index,
            content_block,
        }
    }

    pub fn content_block_delta(index: usize, delta: ContentDelta) -> Self {
        StreamEvent::ContentBlockDelta { index, delta }
    }

    pub fn content_block_stop(index: usize) -> Self {
        StreamEvent::ContentBlockStop { index }
    }

    pub fn error(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: StreamError::new(error_type, message),
        }
    }

    /// The SSE `event:` name for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
            StreamEvent::Ping => "ping",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Content block index, for block-scoped events.
    pub fn content_index(&self) -> Option<usize> {
        match self {
            StreamEvent::ContentBlockStart { index, .. }
            | StreamEvent::ContentBlockDelta { index, .. }
            | StreamEvent::ContentBlockStop { index } => Some(*index),
            _ => None,
        }
    }
}

/// Incremental content update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
}

impl ContentDelta {
    pub fn text(text: impl Into<String>) -> Self {
        ContentDelta::TextDelta { text: text.into() }
    }

    pub fn input_json(partial_json: impl Into<String>) -> Self {
        ContentDelta::InputJsonDelta {
            partial_json: partial_json.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentDelta::TextDelta { text } => Some(text),
            _ => None,
        }
    }
}

/// Final message metadata carried by `message_delta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageDelta {
    pub stop_reason: Option<StopReason>,
    pub stop_sequence: Option<String>,
}

/// Usage carried by `message_delta`: only the output count is final there.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaUsage {
    pub output_tokens: u32,
}

/// The message skeleton sent with `message_start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartialMessage {
    pub id: String,

    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,

    pub role: Role,

    /// Always empty at start.
    #[serde(default)]
    pub content: Vec<ContentBlock>,

    pub model: String,

    pub stop_reason: Option<StopReason>,

    pub stop_sequence: Option<String>,

    pub usage: Usage,
}

fn default_message_type() -> String {
    "message".to_string()
}

impl PartialMessage {
    /// Start-of-stream skeleton with zero output tokens.
    pub fn new(id: impl Into<String>, model: impl Into<String>, input_tokens: u32) -> Self {
        Self {
            id: id.into(),
            message_type: default_message_type(),
            role: Role::Assistant,
            content: Vec::new(),
            model: model.into(),
            stop_reason: None,
            stop_sequence: None,
            usage: Usage::new(input_tokens, 0),
        }
    }
}

/// Error payload of an `error` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl StreamError {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_start_serialization() {
        let event = StreamEvent::MessageStart {
            message: PartialMessage::new("msg_1", "claude-sonnet-4-5", 12),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message_start");
        assert_eq!(json["message"]["content"], json!([]));
        assert_eq!(json["message"]["usage"], json!({"input_tokens": 12, "output_tokens": 0}));
    }

    #[test]
    fn test_delta_serialization() {
        let event = StreamEvent::content_block_delta(2, ContentDelta::input_json("{\"a\":1}"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "content_block_delta",
                "index": 2,
                "delta": {"type": "input_json_delta", "partial_json": "{\"a\":1}"}
            })
        );
    }

    #[test]
    fn test_message_delta_serialization() {
        let event = StreamEvent::MessageDelta {
            delta: MessageDelta {
                stop_reason: Some(StopReason::EndTurn),
                stop_sequence: None,
            },
            usage: DeltaUsage { output_tokens: 7 },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "message_delta",
                "delta": {"stop_reason": "end_turn", "stop_sequence": null},
                "usage": {"output_tokens": 7}
            })
        );
    }

    #[test]
    fn test_error_event() {
        let event = StreamEvent::error("rate_limit_error", "slow down");
        assert_eq!(event.event_type(), "error");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "error", "error": {"type": "rate_limit_error", "message": "slow down"}})
        );
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(StreamEvent::MessageStop.event_type(), "message_stop");
        assert_eq!(StreamEvent::content_block_stop(0).event_type(), "content_block_stop");
        assert_eq!(StreamEvent::content_block_stop(4).content_index(), Some(4));
    }
}
