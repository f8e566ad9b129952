//! Outbound HTTP to the Cloud Code backend.
//!
//! [`Transport`] is the seam between the resilience layer and the network:
//! it performs exactly one POST against one host and reports what came
//! back. Host ordering, retries and failure classification live in
//! [`Dispatcher`](super::dispatch::Dispatcher) and
//! [`ProjectResolver`](super::discovery::ProjectResolver).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cloudcode::error::{GatewayError, Result};
use crate::net::HttpClient;

/// Status and body of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse a successful body as JSON, or turn a failed one into
    /// [`GatewayError::Api`].
    pub fn into_json(self) -> Result<Value> {
        if !self.is_success() {
            return Err(GatewayError::from_response(self.status, self.body));
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// One POST of a JSON body to `{host}{path}` with a bearer token.
///
/// An `Err` means no HTTP response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, host: &str, path: &str, token: &str, body: &Value) -> Result<RawResponse>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, token, body), fields(host = %host, path = %path))]
    async fn post(&self, host: &str, path: &str, token: &str, body: &Value) -> Result<RawResponse> {
        let url = format!("{}{}", host.trim_end_matches('/'), path);

        let response = self
            .http
            .inner()
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Backend responded");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_success() {
        let value = RawResponse::new(200, r#"{"ok":true}"#).into_json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_raw_response_failure() {
        let err = RawResponse::new(503, "unavailable").into_json().unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_raw_response_malformed_body() {
        let err = RawResponse::new(200, "not json").into_json().unwrap_err();
        assert!(matches!(err, GatewayError::Json(_)));
    }
}
