use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::cloudcode::GatewayError;

/// Errors surfaced to Messages API callers, in the Anthropic error format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    RateLimit(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    NotFound(String),
}

/// Anthropic error envelope: `{"type":"error","error":{"type","message"}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    r#type: &'static str,
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    r#type: &'static str,
    message: String,
}

impl AppError {
    /// Map a backend failure onto the caller-facing taxonomy.
    ///
    /// Looks at the innermost failure of an exhausted dispatch.
    pub fn classify(err: &GatewayError) -> Self {
        let root = err.root();
        let detail = err.detail();
        let upper = detail.to_ascii_uppercase();
        let raw = match root {
            GatewayError::Api { message, .. } => message.as_str(),
            _ => "",
        };

        if let GatewayError::Credential(e) = root {
            return Self::Authentication(format!("No usable credential: {e}"));
        }
        if err.is_auth_error() {
            return Self::Authentication(format!("Authentication failed: {detail}"));
        }
        if err.is_rate_limit() || raw.contains("RESOURCE_EXHAUSTED") {
            let retry_after = err
                .retry_after()
                .or_else(|| crate::cloudcode::error::parse_reset_duration(raw));
            return Self::RateLimit(rate_limit_message(retry_after));
        }
        if err.status() == Some(403)
            || raw.contains("PERMISSION_DENIED")
            || upper.contains("LICENSE")
            || upper.contains("ENTITLEMENT")
        {
            return Self::Permission(format!("Permission denied: {detail}"));
        }
        if err.status() == Some(400) {
            return Self::InvalidRequest(detail);
        }
        Self::Api(format!("Upstream error: {detail}"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Permission(_) => StatusCode::FORBIDDEN,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication_error",
            Self::RateLimit(_) => "rate_limit_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Permission(_) => "permission_error",
            Self::Api(_) => "api_error",
            Self::NotFound(_) => "not_found_error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            r#type: "error",
            error: ErrorDetail {
                r#type: self.error_type(),
                message: self.to_string(),
            },
        }
    }
}

fn rate_limit_message(retry_after: Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!("Rate limit exceeded. Quota resets after {}.", format_duration(d)),
        None => "Rate limit exceeded.".to_string(),
    }
}

/// Render a duration as `1h2m3s`, `4m5s`, `3.5s` or `30s`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else if d.subsec_millis() > 0 {
        let secs = format!("{:.3}", d.as_secs_f64());
        format!("{}s", secs.trim_end_matches('0').trim_end_matches('.'))
    } else {
        format!("{s}s")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, axum::Json(self.body())).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        tracing::error!(error = %err, "Backend request failed");
        Self::classify(&err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(format!("Invalid request body: {err}"))
    }
}
