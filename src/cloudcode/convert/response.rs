//! Convert a backend generation response to a Messages API response.

use uuid::Uuid;

use super::content::to_frontend_content;
use crate::cloudcode::models::google::{Candidate, GoogleResponse};
use crate::cloudcode::models::{ContentBlock, MessagesResponse, StopReason, Usage};

/// Convert `response` for a client that asked for `requested_model`.
///
/// Only the first candidate is read. The result always has at least one
/// content block.
pub fn convert_response(response: &GoogleResponse, requested_model: &str) -> MessagesResponse {
    let candidate = response.first_candidate();

    let mut content = candidate
        .map(|c| to_frontend_content(&c.content.parts))
        .unwrap_or_default();
    if content.is_empty() {
        content.push(ContentBlock::text(""));
    }

    let usage = response
        .usage_metadata
        .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    MessagesResponse::new(
        generate_message_id(),
        requested_model,
        content,
        Some(map_stop_reason(candidate)),
        usage,
    )
}

/// `MAX_TOKENS` and `TOOL_USE` map directly and `STOP` ends the turn. An
/// unset or unrecognized reason becomes `tool_use` when the candidate
/// carries a function call.
fn map_stop_reason(candidate: Option<&Candidate>) -> StopReason {
    let Some(candidate) = candidate else {
        return StopReason::EndTurn;
    };

    let has_call = candidate
        .content
        .parts
        .iter()
        .any(|p| p.function_call.is_some());

    match candidate.finish_reason.as_deref() {
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("TOOL_USE") => StopReason::ToolUse,
        Some("STOP") => StopReason::EndTurn,
        _ if has_call => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}

/// `msg_` followed by 32 hex characters.
pub fn generate_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}
