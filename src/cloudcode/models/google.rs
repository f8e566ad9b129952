//! Cloud Code backend wire types.
//!
//! All fields are camelCase on the wire. Response types are lenient: every
//! field is defaulted so partial or unexpected payloads still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cloudcode::constants::{ENVELOPE_REQUEST_TYPE, ENVELOPE_USER_AGENT};

// ============================================================================
// Request envelope
// ============================================================================

/// The outer envelope posted to `generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudCodeRequest {
    /// Routing project id.
    pub project: String,

    /// Backend model id.
    pub model: String,

    pub request: GoogleRequest,

    pub user_agent: String,

    pub request_type: String,

    /// Per-request correlation id, `agent-<uuid>`.
    pub request_id: String,
}

impl CloudCodeRequest {
    pub fn new(
        project: impl Into<String>,
        model: impl Into<String>,
        request: GoogleRequest,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            model: model.into(),
            request,
            user_agent: ENVELOPE_USER_AGENT.to_string(),
            request_type: ENVELOPE_REQUEST_TYPE.to_string(),
            request_id: request_id.into(),
        }
    }
}

/// The nested generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRequest {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    pub generation_config: GenerationConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GoogleTool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,

    /// Large negative decimal, e.g. `-3847562918374650192`.
    pub session_id: String,
}

// ============================================================================
// Contents and parts
// ============================================================================

/// One conversation turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// "user" or "model". Absent on system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.into()),
            parts,
        }
    }

    /// A role-less content, as used by `systemInstruction`.
    pub fn system(parts: Vec<Part>) -> Self {
        Self { role: None, parts }
    }
}

/// A part of a content turn. Exactly one payload field is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Marks `text` as model reasoning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A thought-marked text part.
    pub fn thought(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: Some(true),
            ..Default::default()
        }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Default::default()
        }
    }

    pub fn function_response(response: FunctionResponse) -> Self {
        Self {
            function_response: Some(response),
            ..Default::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Default::default()
        }
    }

    pub fn file_data(mime_type: Option<String>, file_uri: impl Into<String>) -> Self {
        Self {
            file_data: Some(FileData {
                mime_type,
                file_uri: file_uri.into(),
            }),
            ..Default::default()
        }
    }

    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub args: Value,

    /// Correlation id, only exchanged with Claude-family models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// Carries the originating `tool_use_id`.
    pub name: String,

    /// `{"result": "<text>"}`.
    pub response: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

// ============================================================================
// Generation config and tools
// ============================================================================

/// Only fields the client supplied are serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub include_thoughts: bool,
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoogleTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub function_calling_config: FunctionCallingConfig,
}

impl ToolConfig {
    fn with_mode(mode: &str, allowed: Option<Vec<String>>) -> Self {
        Self {
            function_calling_config: FunctionCallingConfig {
                mode: mode.to_string(),
                allowed_function_names: allowed,
            },
        }
    }

    pub fn auto() -> Self {
        Self::with_mode("AUTO", None)
    }

    pub fn any() -> Self {
        Self::with_mode("ANY", None)
    }

    pub fn none() -> Self {
        Self::with_mode("NONE", None)
    }

    /// Force one specific function.
    pub fn force(function_name: impl Into<String>) -> Self {
        Self::with_mode("ANY", Some(vec![function_name.into()]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    /// AUTO, ANY or NONE.
    pub mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_function_names: Option<Vec<String>>,
}

// ============================================================================
// Response
// ============================================================================

/// A generation response, after unwrapping the Cloud Code envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoogleResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GoogleResponse {
    /// Parse a raw `generateContent` body.
    ///
    /// Cloud Code wraps the payload as `{"response": {...}}`; a bare payload
    /// is accepted as well.
    pub fn from_body(body: Value) -> Result<Self, serde_json::Error> {
        match body {
            Value::Object(mut map) if map.get("response").is_some_and(Value::is_object) => {
                let inner = map.remove("response").unwrap_or_default();
                serde_json::from_value(inner)
            }
            other => serde_json::from_value(other),
        }
    }

    pub fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,

    /// STOP, MAX_TOKENS, TOOL_USE, SAFETY, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,

    #[serde(default)]
    pub candidates_token_count: u32,

    #[serde(default)]
    pub total_token_count: u32,
}

// ============================================================================
// Project discovery
// ============================================================================

/// `loadCodeAssist` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCodeAssistResponse {
    /// Either a bare string or `{"id": "..."}`.
    #[serde(default)]
    pub cloudaicompanion_project: Option<Value>,

    #[serde(default)]
    pub current_tier: Option<Value>,
}

impl LoadCodeAssistResponse {
    /// The routing project id, if the response carries a non-empty one.
    pub fn project_id(&self) -> Option<String> {
        let id = match self.cloudaicompanion_project.as_ref()? {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("id").and_then(Value::as_str)?,
            _ => return None,
        };
        (!id.is_empty()).then(|| id.to_string())
    }
}
