//! Constants for the Cloud Code backend.
//!
//! Endpoints, request headers, model catalog and model family detection.

use std::time::Duration;

// ============================================================================
// API Endpoints
// ============================================================================

/// Daily sandbox endpoint. Most permissive, tried first.
pub const CLOUDCODE_ENDPOINT_SANDBOX: &str = "https://daily-cloudcode-pa.sandbox.googleapis.com";

/// Daily/experimental Cloud Code API endpoint.
pub const CLOUDCODE_ENDPOINT_DAILY: &str = "https://daily-cloudcode-pa.googleapis.com";

/// Production Cloud Code API endpoint.
pub const CLOUDCODE_ENDPOINT_PROD: &str = "https://cloudcode-pa.googleapis.com";

/// Host priority order for both discovery and generation.
///
/// Experimental hosts come first, production last.
pub const CLOUDCODE_ENDPOINTS: &[&str] = &[
    CLOUDCODE_ENDPOINT_SANDBOX,
    CLOUDCODE_ENDPOINT_DAILY,
    CLOUDCODE_ENDPOINT_PROD,
];

/// Path for the generateContent verb.
pub const API_PATH_GENERATE_CONTENT: &str = "/v1internal:generateContent";

/// Path for the loadCodeAssist verb (project discovery).
pub const API_PATH_LOAD_CODE_ASSIST: &str = "/v1internal:loadCodeAssist";

// ============================================================================
// Envelope identity
// ============================================================================

/// Project used when discovery yields nothing.
pub const DEFAULT_PROJECT_ID: &str = "rising-fact-p41fc";

/// `userAgent` field of the request envelope.
pub const ENVELOPE_USER_AGENT: &str = "antigravity";

/// `requestType` field of the request envelope.
pub const ENVELOPE_REQUEST_TYPE: &str = "agent";

/// Prefix of the per-request correlation id.
pub const REQUEST_ID_PREFIX: &str = "agent-";

/// Placeholder `thoughtSignature` for replayed Gemini function calls.
///
/// Gemini models reject historical function calls without a signature; this
/// value tells the backend to skip validation.
pub const GEMINI_SKIP_SIGNATURE: &str = "skip_thought_signature_validator";

// ============================================================================
// HTTP Headers
// ============================================================================

/// User-Agent header value for backend requests.
pub const USER_AGENT: &str = "antigravity/1.11.5 linux/amd64";

/// X-Goog-Api-Client header value.
pub const GOOG_API_CLIENT: &str = "google-cloud-sdk vscode_cloudshelleditor/0.1";

/// Client-Metadata header value (JSON).
pub const CLIENT_METADATA: &str =
    r#"{"ideType":"IDE_UNSPECIFIED","platform":"PLATFORM_UNSPECIFIED","pluginType":"GEMINI"}"#;

// ============================================================================
// Timeouts
// ============================================================================

/// Connection timeout for HTTP requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request timeout for generation requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// Request defaults
// ============================================================================

/// `max_tokens` used when the frontend request omits it.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default number of characters per synthesized `text_delta`.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 20;

/// Maximum length of a backend function declaration name.
pub const MAX_TOOL_NAME_LEN: usize = 64;

// ============================================================================
// Model Detection
// ============================================================================

/// Model family classification.
///
/// The Claude family gets tool ids attached to function parts and never
/// receives a thinking config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Claude,
    Gemini,
    Unknown,
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFamily::Claude => write!(f, "claude"),
            ModelFamily::Gemini => write!(f, "gemini"),
            ModelFamily::Unknown => write!(f, "unknown"),
        }
    }
}

/// Determine the model family from a model name (case-insensitive).
///
/// ```
/// use ccgate::cloudcode::constants::{get_model_family, ModelFamily};
///
/// assert_eq!(get_model_family("claude-sonnet-4-5-thinking"), ModelFamily::Claude);
/// assert_eq!(get_model_family("gemini-3-flash"), ModelFamily::Gemini);
/// assert_eq!(get_model_family("gpt-4"), ModelFamily::Unknown);
/// ```
pub fn get_model_family(model: &str) -> ModelFamily {
    let lower = model.to_lowercase();
    if lower.contains("claude") {
        ModelFamily::Claude
    } else if lower.contains("gemini") {
        ModelFamily::Gemini
    } else {
        ModelFamily::Unknown
    }
}

// ============================================================================
// Model Mapping
// ============================================================================

/// Frontend model names and the backend ids they resolve to.
///
/// Names not listed here are sent to the backend unchanged.
pub const MODEL_MAPPINGS: &[(&str, &str)] = &[
    ("claude-sonnet-4-5-20250929", "claude-sonnet-4-5"),
    ("claude-sonnet-4-20250514", "claude-sonnet-4-5"),
    ("claude-3-7-sonnet-20250219", "claude-sonnet-4-5"),
    ("claude-3-5-sonnet-20241022", "claude-sonnet-4-5"),
    ("claude-3-5-sonnet-latest", "claude-sonnet-4-5"),
    ("claude-opus-4-5-20251101", "claude-opus-4-5-thinking"),
    ("claude-opus-4-1-20250805", "claude-opus-4-5-thinking"),
    ("claude-opus-4-20250514", "claude-opus-4-5-thinking"),
    ("claude-haiku-4-5-20251001", "gemini-3-flash"),
    ("claude-3-5-haiku-20241022", "gemini-3-flash"),
    ("claude-3-5-haiku-latest", "gemini-3-flash"),
    ("claude-3-haiku-20240307", "gemini-3-flash"),
];

/// A static catalog entry served by `GET /v1/models`.
#[derive(Debug, Clone, Copy)]
pub struct CatalogModel {
    pub id: &'static str,
    pub display_name: &'static str,
    pub context_window: u32,
    pub max_output_tokens: u32,
}

/// Models advertised to frontend clients.
pub const MODEL_CATALOG: &[CatalogModel] = &[
    CatalogModel {
        id: "claude-sonnet-4-5",
        display_name: "Claude Sonnet 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
    CatalogModel {
        id: "claude-sonnet-4-5-thinking",
        display_name: "Claude Sonnet 4.5 (Thinking)",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
    CatalogModel {
        id: "claude-opus-4-5-thinking",
        display_name: "Claude Opus 4.5 (Thinking)",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
    CatalogModel {
        id: "gemini-3-pro-high",
        display_name: "Gemini 3 Pro (High)",
        context_window: 1_048_576,
        max_output_tokens: 65_536,
    },
    CatalogModel {
        id: "gemini-3-pro-low",
        display_name: "Gemini 3 Pro (Low)",
        context_window: 1_048_576,
        max_output_tokens: 65_536,
    },
    CatalogModel {
        id: "gemini-3-flash",
        display_name: "Gemini 3 Flash",
        context_window: 1_048_576,
        max_output_tokens: 65_536,
    },
    CatalogModel {
        id: "gemini-2.5-flash",
        display_name: "Gemini 2.5 Flash",
        context_window: 1_048_576,
        max_output_tokens: 65_536,
    },
];
