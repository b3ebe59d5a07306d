//! Request and response types of the HTTP API.
//!
//! The response envelopes follow the OpenAI chat completion wire format.
//! `ChatRequest` is the action-dispatched envelope accepted by `POST /api`;
//! `ChatCompletionRequest` is the plain OpenAI body of
//! `POST /v1/chat/completions`.

use serde::{Deserialize, Serialize};

use crate::clock;
use crate::feedback::Feedback;

/// Model echoed back when a request does not name one.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Models advertised by the catalog.
pub const CATALOG_MODELS: [&str; 2] = ["gemini-pro", "gemini-pro-vision"];

// ─── Request Types ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
    /// Any other role string. Accepted, never forwarded.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api`. Which fields matter depends on `action`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub action: String,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub model: Option<String>,
    /// Accepted for compatibility; the provider temperature comes from configuration.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub stream: Option<bool>,
    /// Accepted for compatibility; the provider temperature comes from configuration.
    #[serde(default)]
    pub temperature: Option<f64>,
}

// ─── Response Types ────────────────────────────────────────────────────────

/// Chat completion response (non-streaming).
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Character-count usage. Not a tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Model listing response.
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

impl ModelList {
    /// The fixed catalog, stamped with the current time.
    pub fn catalog() -> Self {
        let created = clock::epoch_secs();
        Self {
            object: "list".to_string(),
            data: CATALOG_MODELS
                .iter()
                .map(|id| ModelInfo {
                    id: id.to_string(),
                    object: "model".to_string(),
                    created,
                    owned_by: "google".to_string(),
                })
                .collect(),
        }
    }
}

/// Response of the `feedback` action.
#[derive(Debug, Serialize)]
pub struct FeedbackReceipt {
    pub success: bool,
    pub feedback: Feedback,
    pub message: String,
}
