//! `GET /v1/models`: the fixed model list.

use axum::{extract::State, response::Json};
use serde::Serialize;

use super::server::AppState;

/// Fixed creation timestamp reported for both entries.
const MODEL_CREATED: u64 = 1_715_367_049;

#[derive(Debug, Serialize)]
pub struct ModelList {
    object: &'static str,
    data: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    id: String,
    object: &'static str,
    created: u64,
    owned_by: &'static str,
}

impl ModelEntry {
    fn new(id: &str, owned_by: &'static str) -> Self {
        Self {
            id: id.to_string(),
            object: "model",
            created: MODEL_CREATED,
            owned_by,
        }
    }
}

/// The public model first, then the upstream model it maps to.
pub fn model_list(public_model: &str, upstream_model: &str) -> ModelList {
    ModelList {
        object: "list",
        data: vec![
            ModelEntry::new(public_model, "openai"),
            ModelEntry::new(upstream_model, "deepseek"),
        ],
    }
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(model_list(
        &state.config.models.public_model,
        &state.config.upstream.model,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_public_then_upstream_model() {
        let value = serde_json::to_value(model_list("gpt-4o", "deepseek-chat")).unwrap();
        assert_eq!(value["object"], json!("list"));
        assert_eq!(value["data"][0]["id"], json!("gpt-4o"));
        assert_eq!(value["data"][1]["id"], json!("deepseek-chat"));
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        assert_eq!(value["data"][0]["object"], json!("model"));
    }
}
