use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream;
use serde_json::Value;

use crate::AppState;
use crate::cloudcode::models::{MessagesRequest, StreamEvent};
use crate::error::AppError;

/// POST /v1/messages
///
/// Anthropic Messages endpoint. The backend is always called without
/// streaming; `stream: true` replays the finished response as SSE events.
pub async fn create_message(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let request = parse_request(&body)?;

    tracing::info!(
        model = %request.model,
        stream = request.is_streaming(),
        messages = request.messages.len(),
        tools = request.tools.as_ref().map_or(0, Vec::len),
        "Messages request"
    );
    if state.config.logging.log_content {
        tracing::debug!(body = %String::from_utf8_lossy(&body), "Request body");
    }

    let result = state.client.complete(&request).await;

    if request.is_streaming() {
        let events: Box<dyn Iterator<Item = StreamEvent> + Send> = match result {
            Ok(response) => Box::new(state.client.stream(response)),
            Err(err) => {
                tracing::error!(error = %err, "Backend request failed");
                let app = recover(&state, AppError::classify(&err)).await;
                Box::new(std::iter::once(StreamEvent::error(app.error_type(), app.to_string())))
            }
        };
        return Ok(sse_response(events));
    }

    match result {
        Ok(response) => {
            if state.config.logging.log_content {
                tracing::debug!(text = %response.text(), "Response text");
            }
            Ok(Json(response).into_response())
        }
        Err(err) => {
            tracing::error!(error = %err, "Backend request failed");
            Err(recover(&state, AppError::classify(&err)).await)
        }
    }
}

/// Parse the body by hand so a missing `messages` array is reported as an
/// `invalid_request_error` before anything else happens.
fn parse_request(body: &[u8]) -> Result<MessagesRequest, AppError> {
    let value: Value = serde_json::from_slice(body)?;
    match value.get("messages") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(AppError::InvalidRequest("messages: must be an array".into())),
        None => return Err(AppError::InvalidRequest("messages: field required".into())),
    }
    Ok(serde_json::from_value(value)?)
}

/// On an authentication failure, refresh once so the caller's retry can
/// succeed. The original request is not re-issued.
async fn recover(state: &AppState, error: AppError) -> AppError {
    if !matches!(error, AppError::Authentication(_)) {
        return error;
    }
    match state.client.refresh().await {
        Ok(_) => AppError::Authentication(format!(
            "{error}. Credentials have been refreshed; please retry the request."
        )),
        Err(e) => {
            tracing::warn!(error = %e, "Credential refresh after authentication failure failed");
            AppError::Authentication(format!("{error}. Credential refresh failed: {}", e.detail()))
        }
    }
}

fn sse_response(events: impl Iterator<Item = StreamEvent> + Send + 'static) -> Response {
    let events = stream::iter(events.map(|event| {
        let sse = Event::default().event(event.event_type());
        Ok::<_, Infallible>(match sse.json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize stream event");
                Event::default().event("error").data(
                    r#"{"type":"error","error":{"type":"api_error","message":"event serialization failed"}}"#,
                )
            }
        })
    }));
    Sse::new(events).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_requires_messages() {
        let err = parse_request(br#"{"model":"claude-sonnet-4-5"}"#).unwrap_err();
        assert_eq!(err.error_type(), "invalid_request_error");
        assert!(err.to_string().contains("messages"));
    }

    #[test]
    fn test_parse_request_rejects_non_array_messages() {
        let err = parse_request(br#"{"model":"m","messages":"hi"}"#).unwrap_err();
        assert_eq!(err, AppError::InvalidRequest("messages: must be an array".into()));
    }

    #[test]
    fn test_parse_request_rejects_invalid_json() {
        let err = parse_request(b"{not json").unwrap_err();
        assert_eq!(err.error_type(), "invalid_request_error");
    }

    #[test]
    fn test_parse_request_ok() {
        let request = parse_request(
            br#"{"model":"claude-sonnet-4-5","messages":[{"role":"user","content":"hi"}],"stream":true}"#,
        )
        .unwrap();
        assert!(request.is_streaming());
        assert_eq!(request.messages.len(), 1);
    }
}
