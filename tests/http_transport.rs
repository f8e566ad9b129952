use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ccgate::auth::StaticCredentials;
use ccgate::cloudcode::constants::{
    API_PATH_GENERATE_CONTENT, API_PATH_LOAD_CODE_ASSIST, GOOG_API_CLIENT, USER_AGENT,
};
use ccgate::cloudcode::models::MessagesRequest;
use ccgate::cloudcode::{CloudCodeClient, HttpTransport, Transport};

const TOKEN: &str = "ya29.integration-test-token";

fn generate_body(text: &str) -> serde_json::Value {
    json!({
        "response": {
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 2 }
        }
    })
}

#[tokio::test]
async fn test_transport_sends_identity_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH_LOAD_CODE_ASSIST))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("user-agent", USER_AGENT))
        .and(header("x-goog-api-client", GOOG_API_CLIENT))
        .and(header_exists("client-metadata"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::default();
    let response = transport
        .post(&server.uri(), API_PATH_LOAD_CODE_ASSIST, TOKEN, &json!({}))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.into_json().unwrap()["ok"], true);
}

#[tokio::test]
async fn test_transport_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH_GENERATE_CONTENT))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota will reset after 10s"))
        .mount(&server)
        .await;

    let transport = HttpTransport::default();
    let response = transport
        .post(&server.uri(), API_PATH_GENERATE_CONTENT, TOKEN, &json!({}))
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    let err = response.into_json().unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(10)));
}

#[tokio::test]
async fn test_transport_network_error() {
    let transport = HttpTransport::default();
    // Port 9 (discard) on localhost is expected to refuse connections.
    let result = transport
        .post("http://127.0.0.1:9", API_PATH_GENERATE_CONTENT, TOKEN, &json!({}))
        .await;
    assert!(matches!(result, Err(ccgate::cloudcode::GatewayError::Network(_))));
}

#[tokio::test]
async fn test_client_end_to_end_with_fallback() {
    let failing = MockServer::start().await;
    let healthy = MockServer::start().await;

    for server in [&failing, &healthy] {
        Mock::given(method("POST"))
            .and(path(API_PATH_LOAD_CODE_ASSIST))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "cloudaicompanionProject": { "id": "wired-project" } })),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(API_PATH_GENERATE_CONTENT))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&failing)
        .await;

    Mock::given(method("POST"))
        .and(path(API_PATH_GENERATE_CONTENT))
        .and(body_partial_json(json!({
            "project": "wired-project",
            "model": "claude-sonnet-4-5",
            "userAgent": "antigravity",
            "requestType": "agent"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(generate_body("pong")))
        .expect(1)
        .mount(&healthy)
        .await;

    let client = CloudCodeClient::builder()
        .credentials(Arc::new(StaticCredentials::new(TOKEN)))
        .hosts(vec![failing.uri(), healthy.uri()])
        .build()
        .unwrap();

    let response = client
        .complete(&MessagesRequest::simple("claude-sonnet-4-5", 64, "ping"))
        .await
        .unwrap();

    assert_eq!(response.text(), "pong");
    assert_eq!(response.usage.input_tokens, 4);
    assert_eq!(client.cached_project().await.as_deref(), Some("wired-project"));
}
