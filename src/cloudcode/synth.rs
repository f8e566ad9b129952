//! Stream synthesis.
//!
//! The backend is called without streaming, so a streaming client gets an
//! event sequence rebuilt from the finished [`MessagesResponse`]. Text is cut
//! into fixed-size character chunks; tool input is sent as one JSON delta.

use std::iter::FusedIterator;

use serde_json::json;

use crate::cloudcode::models::{
    ContentBlock, ContentDelta, DeltaUsage, MessageDelta, MessagesResponse, PartialMessage,
    StreamEvent,
};

/// Produce the event sequence for `response`, `chunk_size` characters per
/// text delta. A chunk size of 0 is treated as 1.
pub fn synthesize(response: MessagesResponse, chunk_size: usize) -> EventStream {
    EventStream {
        response,
        chunk_size: chunk_size.max(1),
        index: 0,
        phase: Phase::MessageStart,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    MessageStart,
    BlockStart,
    /// Byte offset of the next text chunk in the current block.
    TextDelta(usize),
    ToolDelta,
    BlockStop,
    MessageDelta,
    MessageStop,
    Done,
}

/// Lazy, finite, single-pass event sequence.
#[derive(Debug)]
pub struct EventStream {
    response: MessagesResponse,
    chunk_size: usize,
    index: usize,
    phase: Phase,
}

impl EventStream {
    fn block_start(&mut self) -> Option<StreamEvent> {
        let Some(block) = self.response.content.get(self.index) else {
            self.phase = Phase::MessageDelta;
            return None;
        };

        let (start, next) = match block {
            ContentBlock::Text { .. } => (ContentBlock::text(""), Phase::TextDelta(0)),
            ContentBlock::ToolUse { id, name, .. } => (
                ContentBlock::tool_use(id.as_str(), name.as_str(), json!({})),
                Phase::ToolDelta,
            ),
            other => (other.clone(), Phase::BlockStop),
        };
        self.phase = next;
        Some(StreamEvent::content_block_start(self.index, start))
    }

    fn text_delta(&mut self, offset: usize) -> Option<StreamEvent> {
        let text = self
            .response
            .content
            .get(self.index)
            .and_then(ContentBlock::as_text)
            .unwrap_or_default();

        if offset >= text.len() {
            self.phase = Phase::BlockStop;
            return None;
        }

        let rest = &text[offset..];
        let end = rest
            .char_indices()
            .nth(self.chunk_size)
            .map_or(text.len(), |(i, _)| offset + i);
        let chunk = text[offset..end].to_string();

        self.phase = Phase::TextDelta(end);
        Some(StreamEvent::content_block_delta(self.index, ContentDelta::text(chunk)))
    }

    fn tool_delta(&mut self) -> StreamEvent {
        let partial_json = match self.response.content.get(self.index) {
            Some(ContentBlock::ToolUse { input, .. }) => {
                serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string())
            }
            _ => "{}".to_string(),
        };
        self.phase = Phase::BlockStop;
        StreamEvent::content_block_delta(self.index, ContentDelta::input_json(partial_json))
    }
}

impl Iterator for EventStream {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        loop {
            match self.phase {
                Phase::MessageStart => {
                    self.phase = Phase::BlockStart;
                    return Some(StreamEvent::MessageStart {
                        message: PartialMessage::new(
                            self.response.id.as_str(),
                            self.response.model.as_str(),
                            self.response.usage.input_tokens,
                        ),
                    });
                }
                Phase::BlockStart => {
                    if let Some(event) = self.block_start() {
                        return Some(event);
                    }
                }
                Phase::TextDelta(offset) => {
                    if let Some(event) = self.text_delta(offset) {
                        return Some(event);
                    }
                }
                Phase::ToolDelta => return Some(self.tool_delta()),
                Phase::BlockStop => {
                    let event = StreamEvent::content_block_stop(self.index);
                    self.index += 1;
                    self.phase = Phase::BlockStart;
                    return Some(event);
                }
                Phase::MessageDelta => {
                    self.phase = Phase::MessageStop;
                    return Some(StreamEvent::MessageDelta {
                        delta: MessageDelta {
                            stop_reason: self.response.stop_reason,
                            stop_sequence: self.response.stop_sequence.clone(),
                        },
                        usage: DeltaUsage {
                            output_tokens: self.response.usage.output_tokens,
                        },
                    });
                }
                Phase::MessageStop => {
                    self.phase = Phase::Done;
                    return Some(StreamEvent::MessageStop);
                }
                Phase::Done => return None,
            }
        }
    }
}

impl FusedIterator for EventStream {}
