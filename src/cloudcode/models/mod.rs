//! Wire types for both protocols.
//!
//! `content`, `request`, `response`, `stream` and `tools` describe the
//! Messages API surface; `google` describes the Cloud Code backend.

pub mod content;
pub mod google;
pub mod request;
pub mod response;
pub mod stream;
pub mod tools;

pub use content::{ContentBlock, MediaSource, ToolResultContent};
pub use request::{Message, MessageContent, MessagesRequest, Role, SystemBlock, SystemPrompt};
pub use response::{MessagesResponse, StopReason, Usage};
pub use stream::{ContentDelta, DeltaUsage, MessageDelta, PartialMessage, StreamError, StreamEvent};
pub use tools::ToolSpec;
