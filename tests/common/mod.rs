#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use ccgate::auth::{CredentialError, CredentialSource};
use ccgate::cloudcode::constants::{API_PATH_GENERATE_CONTENT, API_PATH_LOAD_CODE_ASSIST};
use ccgate::cloudcode::{GatewayError, RawResponse, Result, Transport};

pub const HOSTS: [&str; 3] = ["https://sandbox.test", "https://daily.test", "https://prod.test"];

pub fn hosts() -> Vec<String> {
    HOSTS.iter().map(|h| h.to_string()).collect()
}

/// One scripted `generateContent` outcome.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Status(u16, String),
    Network,
}

impl Reply {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Status(status, body.into())
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub host: String,
    pub path: String,
    pub token: String,
    pub body: Value,
}

/// In-memory backend. `generateContent` replies are consumed in order;
/// `loadCodeAssist` always reports `project`.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    project: Mutex<Option<String>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            project: Mutex::new(Some("discovered-project".to_string())),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_project(self: Arc<Self>, project: Option<&str>) -> Arc<Self> {
        *self.project.lock().unwrap() = project.map(str::to_string);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == API_PATH_GENERATE_CONTENT)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, host: &str, path: &str, token: &str, body: &Value) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(Call {
            host: host.to_string(),
            path: path.to_string(),
            token: token.to_string(),
            body: body.clone(),
        });

        if path == API_PATH_LOAD_CODE_ASSIST {
            let project = self.project.lock().unwrap().clone();
            let body = match project {
                Some(p) => json!({ "cloudaicompanionProject": p }),
                None => json!({}),
            };
            return Ok(RawResponse::new(200, body.to_string()));
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::status(500, "no scripted reply"));
        match reply {
            Reply::Ok(value) => Ok(RawResponse::new(200, value.to_string())),
            Reply::Status(status, body) => Ok(RawResponse::new(status, body)),
            Reply::Network => Err(GatewayError::Network("connection refused".into())),
        }
    }
}

/// Hands out `token-0`, then `token-N` after the N-th refresh.
#[derive(Default)]
pub struct RotatingCredentials {
    refreshes: AtomicUsize,
    fail_refresh: bool,
}

impl RotatingCredentials {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_refresh() -> Arc<Self> {
        Arc::new(Self {
            refreshes: AtomicUsize::new(0),
            fail_refresh: true,
        })
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for RotatingCredentials {
    async fn get_token(&self) -> std::result::Result<String, CredentialError> {
        Ok(format!("token-{}", self.refreshes()))
    }

    async fn force_refresh(&self) -> std::result::Result<String, CredentialError> {
        if self.fail_refresh {
            return Err(CredentialError::unavailable("signed out"));
        }
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }

    fn name(&self) -> &str {
        "rotating"
    }
}

/// A wrapped `generateContent` body with one text part.
pub fn text_response(text: &str) -> Value {
    json!({
        "response": {
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 7, "totalTokenCount": 19 }
        }
    })
}

/// A wrapped `generateContent` body with a function call and no finish
/// reason.
pub fn tool_call_response(name: &str, args: Value) -> Value {
    json!({
        "response": {
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Let me check." },
                        { "functionCall": { "name": name, "args": args, "id": "toolu_abc" } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 30, "candidatesTokenCount": 11 }
        }
    })
}
