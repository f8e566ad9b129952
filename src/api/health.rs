use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;
use crate::auth::mask_token;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub credential: CredentialStatus,
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CredentialStatus {
    pub present: bool,
    pub source: String,
    pub prefix: Option<String>,
}

/// GET /health
///
/// Reports whether a credential is available and the cached routing
/// project. Never calls the backend.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let token = state.client.token().await;
    if let Err(e) = &token {
        tracing::debug!(error = %e, "Health check: no credential");
    }
    let prefix = token.as_deref().ok().map(mask_token);

    Json(HealthResponse {
        status: if prefix.is_some() { "ok" } else { "degraded" },
        credential: CredentialStatus {
            present: prefix.is_some(),
            source: state.client.credential_source().to_string(),
            prefix,
        },
        project: state.client.cached_project().await,
    })
}
