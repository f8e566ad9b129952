//! Tool definitions.
//!
//! Clients send tools in several dialects: the Messages API shape
//! (`name`, `description`, `input_schema`), the OpenAI function shape
//! (`function.name`, `function.parameters`), and custom-tool wrappers
//! (`custom.name`, `custom.input_schema`). [`ToolSpec`] keeps the raw JSON
//! and reads fields through ordered candidate pointers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cloudcode::constants::MAX_TOOL_NAME_LEN;

/// Candidate locations for the tool name, highest priority first.
const NAME_POINTERS: &[&str] = &["/name", "/function/name", "/custom/name"];

/// Candidate locations for the tool description.
const DESCRIPTION_POINTERS: &[&str] = &[
    "/description",
    "/function/description",
    "/custom/description",
];

/// Candidate locations for the parameter schema.
const SCHEMA_POINTERS: &[&str] = &[
    "/input_schema",
    "/inputSchema",
    "/parameters",
    "/function/parameters",
    "/function/input_schema",
    "/custom/input_schema",
];

/// A tool definition as supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ToolSpec(pub Value);

impl ToolSpec {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Return the first non-empty value found at `pointers`, in order.
    ///
    /// A value is empty when it is null, an empty string, or an empty object.
    /// Every tool field lookup goes through this helper.
    pub fn extract<'a>(&'a self, pointers: &[&str]) -> Option<&'a Value> {
        pointers
            .iter()
            .filter_map(|p| self.0.pointer(p))
            .find(|v| !is_empty_value(v))
    }

    /// Raw tool name, if any candidate location holds a non-empty string.
    pub fn name(&self) -> Option<&str> {
        self.extract_str(NAME_POINTERS)
    }

    pub fn description(&self) -> Option<&str> {
        self.extract_str(DESCRIPTION_POINTERS)
    }

    pub fn schema(&self) -> Option<&Value> {
        self.extract(SCHEMA_POINTERS).filter(|v| v.is_object())
    }

    /// Backend-safe name for the tool at position `index`.
    pub fn sanitized_name(&self, index: usize) -> String {
        sanitize_tool_name(self.name(), index)
    }

    fn extract_str(&self, pointers: &[&str]) -> Option<&str> {
        pointers
            .iter()
            .filter_map(|p| self.0.pointer(p).and_then(Value::as_str))
            .find(|s| !s.is_empty())
    }
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Restrict a tool name to `[A-Za-z0-9_-]`, at most 64 characters.
///
/// Disallowed characters become `_`. An absent name, or one that sanitizes to
/// nothing, becomes `tool_<index>`.
pub fn sanitize_tool_name(name: Option<&str>, index: usize) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TOOL_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        format!("tool_{index}")
    } else {
        cleaned
    }
}
