use serde::{Deserialize, Serialize};

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Sampling options passed through to the model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Response body for a non-streaming `/api/generate` call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
    pub total_duration: Option<u64>,
    pub eval_count: Option<u64>,
}

/// One installed model, from `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Response body for `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}
