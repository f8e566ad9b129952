pub mod health;
pub mod messages;
pub mod models;
pub mod refresh;

use axum::Router;
use axum::http::{Method, Uri};
use axum::routing::{get, post};

use crate::AppState;
use crate::error::AppError;

/// Build the API router.
///
/// Route layout:
/// ```text
/// /v1/messages      POST
/// /v1/models        GET
/// /refresh-token    POST
/// /health           GET
/// *                 404 not_found_error
/// ```
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/messages", post(messages::create_message))
        .route("/v1/models", get(models::list_models))
        .route("/refresh-token", post(refresh::refresh_token))
        .fallback(not_found)
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {method} {}", uri.path()))
}
