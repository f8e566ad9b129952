//! Error types for the Cloud Code gateway core.

use std::time::Duration;

use serde_json::Value;

use crate::auth::CredentialError;

/// Result type alias using [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors produced while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Non-success HTTP status from a backend host.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Raw response body.
        message: String,
        /// Parsed quota reset delay, when the body carries one.
        retry_after: Option<Duration>,
    },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Every backend host failed; carries the last recorded failure.
    #[error("All endpoints exhausted: {last}")]
    Exhausted { last: Box<GatewayError> },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Network(e.to_string())
    }
}

impl GatewayError {
    pub fn config(msg: impl Into<String>) -> Self {
        GatewayError::Config(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        GatewayError::Api {
            status,
            message: message.into(),
            retry_after,
        }
    }

    /// Build an [`GatewayError::Api`] from a failed response, parsing any
    /// quota reset delay out of the body.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let retry_after = parse_reset_duration(&body);
        GatewayError::Api {
            status,
            message: body,
            retry_after,
        }
    }

    /// The innermost failure of an `Exhausted` chain.
    pub fn root(&self) -> &GatewayError {
        match self {
            GatewayError::Exhausted { last } => last.root(),
            other => other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.root() {
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.status() == Some(429)
    }

    /// 401, or a body that reports rejected credentials.
    pub fn is_auth_error(&self) -> bool {
        match self.root() {
            GatewayError::Api { status: 401, .. } => true,
            GatewayError::Api { message, .. } => {
                message.contains("UNAUTHENTICATED")
                    || message
                        .to_ascii_lowercase()
                        .contains("invalid authentication credentials")
            }
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self.root() {
            GatewayError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Human-readable backend message: `error.message` when the body is a
    /// JSON error envelope, the raw text otherwise.
    pub fn detail(&self) -> String {
        match self.root() {
            GatewayError::Api { message, .. } => backend_message(message).unwrap_or_else(|| message.clone()),
            other => other.to_string(),
        }
    }
}

/// Extract `error.message` from a Google-style error body.
pub fn backend_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Find a quota reset delay in backend error text.
///
/// Recognizes `"quotaResetDelay": "3.5s"`, `"retryDelay": "30s"` and
/// `reset after 1h2m3s`.
pub fn parse_reset_duration(text: &str) -> Option<Duration> {
    for key in ["quotaResetDelay", "retryDelay"] {
        if let Some(pos) = text.find(key) {
            let rest = text[pos + key.len()..]
                .trim_start_matches(|c: char| c == '"' || c == ':' || c.is_whitespace());
            if let Some(d) = parse_duration(rest) {
                return Some(d);
            }
        }
    }

    let lower = text.to_ascii_lowercase();
    let marker = "reset after";
    let pos = lower.find(marker)?;
    parse_duration(lower[pos + marker.len()..].trim_start())
}

/// Parse a leading Go-style duration such as `1h2m3s`, `3.5s` or `250ms`.
fn parse_duration(s: &str) -> Option<Duration> {
    let token: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | 'h' | 'm' | 's'))
        .collect();

    let mut chars = token.chars().peekable();
    let mut number = String::new();
    let mut total = 0f64;
    let mut matched = false;

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let value: f64 = number.parse().ok()?;
        number.clear();
        total += match c {
            'h' => value * 3600.0,
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                value / 1000.0
            }
            'm' => value * 60.0,
            's' => value,
            _ => return None,
        };
        matched = true;
    }

    if !matched {
        return None;
    }
    Duration::try_from_secs_f64(total).ok()
}
