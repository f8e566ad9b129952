use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::cloudcode::constants::{CatalogModel, MODEL_CATALOG};

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub r#type: &'static str,
    pub display_name: String,
    pub created_at: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub data: Vec<ModelInfo>,
    pub has_more: bool,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
}

impl ModelsResponse {
    pub fn from_catalog(catalog: &[CatalogModel], created_at: &str) -> Self {
        let data: Vec<ModelInfo> = catalog
            .iter()
            .map(|m| ModelInfo {
                id: m.id.to_string(),
                r#type: "model",
                display_name: m.display_name.to_string(),
                created_at: created_at.to_string(),
                context_window: m.context_window,
                max_output_tokens: m.max_output_tokens,
            })
            .collect();

        Self {
            first_id: data.first().map(|m| m.id.clone()),
            last_id: data.last().map(|m| m.id.clone()),
            has_more: false,
            data,
        }
    }
}

/// GET /v1/models
///
/// Static model catalog in the Anthropic list format.
pub async fn list_models() -> Json<ModelsResponse> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    Json(ModelsResponse::from_catalog(MODEL_CATALOG, &now))
}
