//! JSON Schema sanitization for tool parameters.
//!
//! The backend accepts only a small subset of JSON Schema. Unsupported
//! keywords are stripped recursively; everything else passes through
//! untouched, including `type` casing.
//!
//! ```rust
//! use serde_json::json;
//! use ccgate::cloudcode::convert::sanitize_schema;
//!
//! let schema = json!({
//!     "type": "object",
//!     "additionalProperties": false,
//!     "properties": {
//!         "name": {"type": "string", "minLength": 1, "maxLength": 100}
//!     },
//!     "required": ["name"]
//! });
//!
//! assert_eq!(
//!     sanitize_schema(&schema),
//!     json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]})
//! );
//! ```

use serde_json::{Map, Value};

/// Keywords removed at every schema level.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    // meta / reference
    "$schema",
    "$id",
    "$ref",
    "$defs",
    "$comment",
    "$anchor",
    "$dynamicRef",
    "$dynamicAnchor",
    "$vocabulary",
    "definitions",
    // composition
    "anyOf",
    "allOf",
    "oneOf",
    // bounds
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "minContains",
    "maxContains",
    // pattern / format
    "pattern",
    "patternProperties",
    "format",
    "additionalProperties",
    // conditional
    "if",
    "then",
    "else",
    "not",
    "dependentSchemas",
    "dependentRequired",
    // content encoding
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
    "unevaluatedItems",
    "unevaluatedProperties",
    "propertyNames",
];

const COMPOSITION_KEYWORDS: &[&str] = &["anyOf", "allOf", "oneOf"];

/// Strip unsupported keywords from a tool parameter schema.
///
/// Non-object input is returned unchanged. Never fails.
pub fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(obj) => Value::Object(sanitize_object(obj)),
        other => other.clone(),
    }
}

fn sanitize_object(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut result = Map::with_capacity(obj.len());

    for (key, value) in obj {
        if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) {
            continue;
        }

        let sanitized = match (key.as_str(), value) {
            // Keys of `properties` are property names, not keywords.
            ("properties", Value::Object(props)) => Value::Object(
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), sanitize_value(prop)))
                    .collect(),
            ),
            ("items", Value::Array(schemas)) => {
                Value::Array(schemas.iter().map(sanitize_items).collect())
            }
            ("items", items) => sanitize_items(items),
            (_, other) => sanitize_value(other),
        };

        result.insert(key.clone(), sanitized);
    }

    result
}

/// Polymorphic item schemas cannot be expressed; they become `{}`.
fn sanitize_items(items: &Value) -> Value {
    match items {
        Value::Object(obj) if COMPOSITION_KEYWORDS.iter().any(|k| obj.contains_key(*k)) => {
            Value::Object(Map::new())
        }
        other => sanitize_value(other),
    }
}

fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(sanitize_object(obj)),
        Value::Array(values) => Value::Array(values.iter().map(sanitize_value).collect()),
        scalar => scalar.clone(),
    }
}
