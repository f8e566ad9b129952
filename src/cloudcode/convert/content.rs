//! Content block conversion between the Messages API and backend parts.
//!
//! | Messages API            | Backend part                                   |
//! |-------------------------|------------------------------------------------|
//! | text                    | `{text}`                                       |
//! | image/document (base64) | `{inlineData: {mimeType, data}}`               |
//! | image/document (url)    | `{fileData: {mimeType?, fileUri}}`             |
//! | tool_use                | `{functionCall: {name, args, id?}}`            |
//! | tool_result             | `{functionResponse: {name, response, id?}}`    |
//! | thinking                | dropped (Claude) / `{text, thought: true}`     |
//!
//! `id` fields are only attached for Claude-family models.

use serde_json::json;

use crate::cloudcode::constants::GEMINI_SKIP_SIGNATURE;
use crate::cloudcode::models::google::{FunctionCall, FunctionResponse, Part};
use crate::cloudcode::models::{ContentBlock, MediaSource, MessageContent, Role};

/// Map a Messages API role to a backend role.
pub fn convert_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::Other => "user",
    }
}

/// Map a raw role string to a backend role. Unknown roles become "user".
pub fn convert_role_str(role: &str) -> &'static str {
    match role {
        "assistant" => "model",
        _ => "user",
    }
}

/// Convert one message's content to backend parts.
///
/// Never returns an empty vector: when nothing maps, a single empty text part
/// is returned.
pub fn to_backend_parts(content: &MessageContent, is_claude: bool) -> Vec<Part> {
    let mut parts = match content {
        MessageContent::Text(text) => vec![Part::text(text.as_str())],
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| block_to_part(block, is_claude))
            .collect(),
    };

    if parts.is_empty() {
        parts.push(Part::text(""));
    }
    parts
}

fn block_to_part(block: &ContentBlock, is_claude: bool) -> Option<Part> {
    let part = match block {
        ContentBlock::Text { text } => Part::text(text.as_str()),

        ContentBlock::Image { source } | ContentBlock::Document { source } => match source {
            MediaSource::Base64 { media_type, data } => {
                Part::inline_data(media_type.as_str(), data.as_str())
            }
            MediaSource::Url { url, media_type } => Part::file_data(media_type.clone(), url.as_str()),
        },

        ContentBlock::ToolUse { id, name, input } => {
            let mut part = Part::function_call(FunctionCall {
                name: name.clone(),
                args: input.clone(),
                id: is_claude.then(|| id.clone()),
            });
            if !is_claude {
                part.thought_signature = Some(GEMINI_SKIP_SIGNATURE.to_string());
            }
            part
        }

        ContentBlock::ToolResult {
            tool_use_id,
            content,
            ..
        } => {
            let result = content.as_ref().map(|c| c.to_text()).unwrap_or_default();
            Part::function_response(FunctionResponse {
                name: tool_use_id.clone(),
                response: json!({ "result": result }),
                id: is_claude.then(|| tool_use_id.clone()),
            })
        }

        ContentBlock::Thinking { .. } if is_claude => return None,
        ContentBlock::Thinking { thinking, .. } => Part::thought(thinking.as_str()),

        ContentBlock::Unknown => return None,
    };
    Some(part)
}

/// Convert backend parts to Messages API content blocks.
///
/// Thought parts are dropped. Function calls without an id get a generated
/// `toolu_` id. Other part kinds (inline data, function responses) have no
/// response-side representation and are skipped.
pub fn to_frontend_content(parts: &[Part]) -> Vec<ContentBlock> {
    parts
        .iter()
        .filter(|part| !part.is_thought())
        .filter_map(|part| {
            if let Some(call) = &part.function_call {
                let id = call
                    .id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(generate_tool_use_id);
                let input = if call.args.is_null() {
                    json!({})
                } else {
                    call.args.clone()
                };
                return Some(ContentBlock::tool_use(id, call.name.as_str(), input));
            }
            part.text.as_deref().map(ContentBlock::text)
        })
        .collect()
}

/// `toolu_` followed by 24 random hex characters.
pub fn generate_tool_use_id() -> String {
    format!("toolu_{:024x}", rand::random::<u128>() >> 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::cloudcode::models::ToolResultContent;

    #[test]
    fn test_convert_role() {
        assert_eq!(convert_role(Role::User), "user");
        assert_eq!(convert_role(Role::Assistant), "model");
        assert_eq!(convert_role(Role::Other), "user");
        assert_eq!(convert_role_str("system"), "user");
        assert_eq!(convert_role_str("assistant"), "model");
    }

    #[test]
    fn test_plain_text_content() {
        let parts = to_backend_parts(&MessageContent::from("Hello"), true);
        assert_eq!(parts, vec![Part::text("Hello")]);
    }

    #[test]
    fn test_text_round_trip() {
        let parts = to_backend_parts(&MessageContent::from("multi\nline text"), false);
        let blocks = to_frontend_content(&parts);
        assert_eq!(blocks, vec![ContentBlock::text("multi\nline text")]);
    }

    #[test]
    fn test_image_base64_and_url() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::image_base64("image/png", "iVBOR"),
            ContentBlock::document_url("https://example.com/a.pdf", Some("application/pdf".into())),
        ]);
        let parts = to_backend_parts(&content, true);
        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(
            json,
            json!([
                {"inlineData": {"mimeType": "image/png", "data": "iVBOR"}},
                {"fileData": {"mimeType": "application/pdf", "fileUri": "https://example.com/a.pdf"}}
            ])
        );
    }

    #[test]
    fn test_tool_use_claude_keeps_id() {
        let content = MessageContent::Blocks(vec![ContentBlock::tool_use(
            "toolu_abc",
            "get_weather",
            json!({"city": "Oslo"}),
        )]);
        let parts = to_backend_parts(&content, true);
        let call = parts[0].function_call.as_ref().unwrap();
        assert_eq!(call.id.as_deref(), Some("toolu_abc"));
        assert!(parts[0].thought_signature.is_none());

        let back = to_frontend_content(&parts);
        assert_eq!(
            back,
            vec![ContentBlock::tool_use("toolu_abc", "get_weather", json!({"city": "Oslo"}))]
        );
    }

    #[test]
    fn test_tool_use_gemini_drops_id() {
        let content = MessageContent::Blocks(vec![ContentBlock::tool_use(
            "toolu_abc",
            "get_weather",
            json!({"city": "Oslo"}),
        )]);
        let parts = to_backend_parts(&content, false);
        let call = parts[0].function_call.as_ref().unwrap();
        assert!(call.id.is_none());
        assert_eq!(parts[0].thought_signature.as_deref(), Some(GEMINI_SKIP_SIGNATURE));

        let back = to_frontend_content(&parts);
        let (id, name, input) = back[0].as_tool_use().unwrap();
        assert!(id.starts_with("toolu_"));
        assert_eq!(name, "get_weather");
        assert_eq!(input, &json!({"city": "Oslo"}));
    }

    #[test]
    fn test_tool_result_string() {
        let content = MessageContent::Blocks(vec![ContentBlock::tool_result("toolu_1", "sunny")]);
        let parts = to_backend_parts(&content, true);
        let response = parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.name, "toolu_1");
        assert_eq!(response.response, json!({"result": "sunny"}));
        assert_eq!(response.id.as_deref(), Some("toolu_1"));
    }

    #[test]
    fn test_tool_result_blocks_joined() {
        let content = MessageContent::Blocks(vec![ContentBlock::ToolResult {
            tool_use_id: "toolu_2".into(),
            content: Some(ToolResultContent::Blocks(vec![
                ContentBlock::text("a"),
                ContentBlock::image_base64("image/png", "x"),
                ContentBlock::text("b"),
            ])),
            is_error: None,
        }]);
        let parts = to_backend_parts(&content, false);
        let response = parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.response, json!({"result": "a\nb"}));
        assert!(response.id.is_none());
    }

    #[test]
    fn test_tool_result_without_content() {
        let content = MessageContent::Blocks(vec![ContentBlock::ToolResult {
            tool_use_id: "toolu_3".into(),
            content: None,
            is_error: Some(true),
        }]);
        let parts = to_backend_parts(&content, true);
        assert_eq!(
            parts[0].function_response.as_ref().unwrap().response,
            json!({"result": ""})
        );
    }

    #[test]
    fn test_thinking_dropped_for_claude() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::thinking("pondering", Some("sig".into())),
            ContentBlock::text("answer"),
        ]);
        let parts = to_backend_parts(&content, true);
        assert_eq!(parts, vec![Part::text("answer")]);
    }

    #[test]
    fn test_thinking_kept_as_thought_for_gemini() {
        let content = MessageContent::Blocks(vec![ContentBlock::thinking("pondering", None)]);
        let parts = to_backend_parts(&content, false);
        assert_eq!(parts, vec![Part::thought("pondering")]);
    }

    #[test]
    fn test_empty_content_yields_empty_text_part() {
        let only_thinking = MessageContent::Blocks(vec![ContentBlock::thinking("x", None)]);
        assert_eq!(to_backend_parts(&only_thinking, true), vec![Part::text("")]);
        assert_eq!(
            to_backend_parts(&MessageContent::Blocks(vec![]), true),
            vec![Part::text("")]
        );
        assert_eq!(
            to_backend_parts(&MessageContent::Blocks(vec![ContentBlock::Unknown]), false),
            vec![Part::text("")]
        );
    }

    #[test]
    fn test_frontend_content_drops_thoughts() {
        let parts = vec![Part::thought("secret"), Part::text("visible")];
        assert_eq!(to_frontend_content(&parts), vec![ContentBlock::text("visible")]);
    }

    #[test]
    fn test_frontend_content_null_args() {
        let parts = vec![Part::function_call(FunctionCall {
            name: "noop".into(),
            args: serde_json::Value::Null,
            id: Some(String::new()),
        })];
        let blocks = to_frontend_content(&parts);
        let (id, _, input) = blocks[0].as_tool_use().unwrap();
        assert_eq!(id.len(), "toolu_".len() + 24);
        assert_eq!(input, &json!({}));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_tool_use_id();
        let b = generate_tool_use_id();
        assert_ne!(a, b);
        assert!(a[6..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
