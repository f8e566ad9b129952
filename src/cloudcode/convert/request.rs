//! Build the Cloud Code request envelope from a Messages API request.

use std::collections::HashMap;

use rand::Rng;
use serde_json::Value;
use uuid::Uuid;

use super::content::{convert_role, to_backend_parts};
use super::schema::sanitize_schema;
use crate::cloudcode::constants::{MODEL_MAPPINGS, ModelFamily, REQUEST_ID_PREFIX, get_model_family};
use crate::cloudcode::models::google::{
    CloudCodeRequest, Content, FunctionDeclaration, GenerationConfig, GoogleRequest, GoogleTool,
    Part, ThinkingConfig, ToolConfig,
};
use crate::cloudcode::models::tools::sanitize_tool_name;
use crate::cloudcode::models::{MessagesRequest, SystemPrompt, ToolSpec};

/// Frontend model name to backend model id lookup.
///
/// Configured aliases take precedence over the built-in table. Unknown names
/// resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct ModelMap {
    aliases: HashMap<String, String>,
}

impl ModelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn resolve<'a>(&'a self, model: &'a str) -> &'a str {
        if let Some(alias) = self.aliases.get(model) {
            return alias;
        }
        MODEL_MAPPINGS
            .iter()
            .find(|(from, _)| *from == model)
            .map(|(_, to)| *to)
            .unwrap_or(model)
    }
}

/// Build the backend envelope for `request`, routed to `project`.
pub fn build_request(request: &MessagesRequest, project: &str, models: &ModelMap) -> CloudCodeRequest {
    let model = models.resolve(&request.model);
    let family = get_model_family(model);
    let is_claude = family == ModelFamily::Claude;

    let contents = request
        .messages
        .iter()
        .map(|msg| Content::new(convert_role(msg.role), to_backend_parts(&msg.content, is_claude)))
        .collect();

    let google = GoogleRequest {
        contents,
        system_instruction: request.system.as_ref().and_then(build_system_instruction),
        generation_config: build_generation_config(request, family),
        tools: request.tools.as_deref().and_then(build_tools),
        tool_config: request
            .tool_choice
            .as_ref()
            .filter(|_| request.has_tools())
            .and_then(build_tool_config),
        session_id: generate_session_id(),
    };

    CloudCodeRequest::new(project, model, google, generate_request_id())
}

fn build_system_instruction(system: &SystemPrompt) -> Option<Content> {
    let parts: Vec<Part> = system
        .segments()
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(Part::text)
        .collect();
    (!parts.is_empty()).then(|| Content::system(parts))
}

fn build_generation_config(request: &MessagesRequest, family: ModelFamily) -> GenerationConfig {
    // Thinking breaks multi-turn signature validation for Claude models.
    let thinking_config = match family {
        ModelFamily::Claude => None,
        _ => request.thinking_budget().map(|budget| ThinkingConfig {
            include_thoughts: true,
            thinking_budget: budget,
        }),
    };

    GenerationConfig {
        max_output_tokens: request.max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        stop_sequences: request.stop_sequences.clone().filter(|s| !s.is_empty()),
        thinking_config,
    }
}

fn build_tools(tools: &[ToolSpec]) -> Option<Vec<GoogleTool>> {
    if tools.is_empty() {
        return None;
    }

    let declarations = tools
        .iter()
        .enumerate()
        .map(|(index, tool)| FunctionDeclaration {
            name: tool.sanitized_name(index),
            description: tool.description().map(str::to_string),
            parameters: tool.schema().map(sanitize_schema),
        })
        .collect();

    Some(vec![GoogleTool {
        function_declarations: declarations,
    }])
}

/// Map a Messages API `tool_choice` to a backend tool config.
///
/// Accepts `{"type": "auto"|"any"|"none"|"tool", "name"?}` or a bare string.
/// Anything else is ignored.
fn build_tool_config(choice: &Value) -> Option<ToolConfig> {
    let kind = match choice {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("type").and_then(Value::as_str)?,
        _ => return None,
    };

    match kind {
        "auto" => Some(ToolConfig::auto()),
        "any" | "required" => Some(ToolConfig::any()),
        "none" => Some(ToolConfig::none()),
        "tool" => {
            let name = choice.get("name").and_then(Value::as_str)?;
            Some(ToolConfig::force(sanitize_tool_name(Some(name), 0)))
        }
        _ => None,
    }
}

/// A random negative decimal with 19 digits, e.g. `-4718293746501928374`.
pub fn generate_session_id() -> String {
    let n: u64 = rand::rng().random_range(1_000_000_000_000_000_000..9_000_000_000_000_000_000);
    format!("-{n}")
}

/// `agent-<uuid v4>`.
pub fn generate_request_id() -> String {
    format!("{REQUEST_ID_PREFIX}{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudcode::models::{ContentBlock, Message};
    use serde_json::json;

    fn request_json(value: Value) -> MessagesRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_model_mapping() {
        let map = ModelMap::new();
        assert_eq!(map.resolve("claude-sonnet-4-5-20250929"), "claude-sonnet-4-5");
        assert_eq!(map.resolve("claude-3-5-haiku-20241022"), "gemini-3-flash");
        assert_eq!(map.resolve("some-future-model"), "some-future-model");

        let aliased = ModelMap::with_aliases(HashMap::from([(
            "claude-sonnet-4-5-20250929".to_string(),
            "claude-sonnet-4-5-thinking".to_string(),
        )]));
        assert_eq!(
            aliased.resolve("claude-sonnet-4-5-20250929"),
            "claude-sonnet-4-5-thinking"
        );
    }

    #[test]
    fn test_basic_envelope() {
        let request = MessagesRequest::simple("claude-sonnet-4-5-20250929", 512, "Hi");
        let built = build_request(&request, "proj-1", &ModelMap::new());

        assert_eq!(built.project, "proj-1");
        assert_eq!(built.model, "claude-sonnet-4-5");
        assert!(built.request_id.starts_with("agent-"));
        assert_eq!(built.request.contents.len(), 1);
        assert_eq!(built.request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(built.request.generation_config.max_output_tokens, 512);
        assert!(built.request.tools.is_none());
        assert!(built.request.system_instruction.is_none());
    }

    #[test]
    fn test_generation_config_only_present_fields() {
        let request = MessagesRequest::builder()
            .model("gemini-3-flash")
            .max_tokens(100)
            .temperature(0.5)
            .message(Message::user("x"))
            .build();
        let built = build_request(&request, "p", &ModelMap::new());
        let json = serde_json::to_value(&built.request.generation_config).unwrap();
        assert_eq!(json, json!({"maxOutputTokens": 100, "temperature": 0.5}));
    }

    #[test]
    fn test_all_sampling_fields() {
        let request = request_json(json!({
            "model": "gemini-3-flash",
            "max_tokens": 10,
            "temperature": 1.0,
            "top_p": 0.5,
            "top_k": 40,
            "stop_sequences": ["END"],
            "messages": [{"role": "user", "content": "x"}]
        }));
        let built = build_request(&request, "p", &ModelMap::new());
        let json = serde_json::to_value(&built.request.generation_config).unwrap();
        assert_eq!(
            json,
            json!({"maxOutputTokens": 10, "temperature": 1.0, "topP": 0.5, "topK": 40, "stopSequences": ["END"]})
        );
    }

    #[test]
    fn test_system_prompt_blocks() {
        let request = request_json(json!({
            "model": "claude-sonnet-4-5",
            "system": [{"type": "text", "text": "Be brief."}, {"type": "text", "text": "Be kind."}],
            "messages": [{"role": "user", "content": "x"}]
        }));
        let built = build_request(&request, "p", &ModelMap::new());
        let system = built.request.system_instruction.unwrap();
        assert!(system.role.is_none());
        assert_eq!(system.parts, vec![Part::text("Be brief."), Part::text("Be kind.")]);
    }

    #[test]
    fn test_tools_sanitized() {
        let request = request_json(json!({
            "model": "claude-sonnet-4-5",
            "messages": [{"role": "user", "content": "x"}],
            "tools": [
                {"name": "mcp__fs.read file", "description": "Read", "input_schema": {"type": "object", "additionalProperties": false}},
                {"type": "function", "function": {"parameters": {"type": "object"}}}
            ],
            "tool_choice": {"type": "auto"}
        }));
        let built = build_request(&request, "p", &ModelMap::new());
        let tools = built.request.tools.unwrap();
        let decls = &tools[0].function_declarations;
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "mcp__fs_read_file");
        assert_eq!(decls[0].description.as_deref(), Some("Read"));
        assert_eq!(decls[0].parameters, Some(json!({"type": "object"})));
        assert_eq!(decls[1].name, "tool_1");
        assert_eq!(built.request.tool_config, Some(ToolConfig::auto()));
    }

    #[test]
    fn test_tool_choice_specific_tool() {
        assert_eq!(
            build_tool_config(&json!({"type": "tool", "name": "lookup"})),
            Some(ToolConfig::force("lookup"))
        );
        assert_eq!(build_tool_config(&json!({"type": "any"})), Some(ToolConfig::any()));
        assert_eq!(build_tool_config(&json!("none")), Some(ToolConfig::none()));
        assert_eq!(build_tool_config(&json!({"type": "weird"})), None);
        assert_eq!(build_tool_config(&json!(42)), None);
    }

    #[test]
    fn test_thinking_omitted_for_claude() {
        let request = MessagesRequest::builder()
            .model("claude-sonnet-4-5-thinking")
            .thinking(json!({"type": "enabled", "budget_tokens": 4096}))
            .message(Message::user("x"))
            .build();
        let built = build_request(&request, "p", &ModelMap::new());
        assert!(built.request.generation_config.thinking_config.is_none());
    }

    #[test]
    fn test_thinking_sent_for_gemini() {
        let request = MessagesRequest::builder()
            .model("gemini-3-pro-high")
            .thinking(json!({"type": "enabled", "budget_tokens": 4096}))
            .message(Message::user("x"))
            .build();
        let built = build_request(&request, "p", &ModelMap::new());
        assert_eq!(
            built.request.generation_config.thinking_config,
            Some(ThinkingConfig {
                include_thoughts: true,
                thinking_budget: 4096
            })
        );
    }

    #[test]
    fn test_claude_family_decided_by_resolved_model() {
        let request = MessagesRequest::builder()
            .model("claude-3-5-haiku-20241022")
            .message(Message::assistant_blocks(vec![ContentBlock::tool_use(
                "toolu_1",
                "f",
                json!({}),
            )]))
            .build();
        let built = build_request(&request, "p", &ModelMap::new());
        assert_eq!(built.model, "gemini-3-flash");
        let call = built.request.contents[0].parts[0].function_call.as_ref().unwrap();
        assert!(call.id.is_none());
        assert_eq!(built.request.contents[0].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_session_and_request_ids() {
        let session = generate_session_id();
        assert!(session.starts_with('-'));
        assert_eq!(session.len(), 20);
        assert!(session[1..].chars().all(|c| c.is_ascii_digit()));

        assert_ne!(generate_request_id(), generate_request_id());
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
