//! Uniform error envelopes for the HTTP surface.
//!
//! | variant       | status | body                                              |
//! |---------------|--------|---------------------------------------------------|
//! | `BadRequest`  | 400    | `{"error": msg}`                                  |
//! | `InvalidBody` | 422    | `{"error": "Invalid request body", "details": ..}` |
//! | `Internal`    | 500    | `{"error": "Internal server error", "details": ..}` |

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::feedback::FeedbackError;
use crate::provider::ProviderError;

pub const INVALID_ACTION: &str =
    "Invalid action. Use 'chat', 'models', 'feedback', or 'getFeedback'";
pub const MESSAGES_REQUIRED: &str = "Messages array is required";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::InvalidBody(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "Invalid request body", "details": details })),
            )
                .into_response(),
            ApiError::Internal(details) => {
                error!(details = %details, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error", "details": details })),
                )
                    .into_response()
            }
        }
    }
}

/// Render a handler panic as a 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(details).into_response()
}
