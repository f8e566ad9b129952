use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;
use crate::auth::mask_token;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub token_prefix: String,
}

/// POST /refresh-token
///
/// Drops the cached project and forces a new credential.
pub async fn refresh_token(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let token = state.client.refresh().await?;
    tracing::info!(token = %mask_token(&token), "Credential refreshed via API");

    Ok(Json(RefreshResponse {
        status: "ok",
        token_prefix: mask_token(&token),
    }))
}
