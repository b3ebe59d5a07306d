//! LLM provider access.
//!
//! - [`gemini`]: Google Gemini REST client
//! - [`sse`]: Incremental decoder for the provider's event stream
//! - [`scripted`]: Canned-reply provider for tests and offline runs
//!
//! The chat adapter only depends on [`ChatProvider`]: one call that returns
//! the whole reply and one that yields it as a lazy stream of fragments.
//! Both report faults as [`ProviderError`].

pub mod gemini;
pub mod scripted;
pub mod sse;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Gemini API error: {0}")]
    Api(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Roles the provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderRole {
    User,
    System,
}

/// A message in the provider's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMessage {
    pub role: ProviderRole,
    pub content: String,
}

impl ProviderMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::System,
            content: content.into(),
        }
    }
}

/// Reply fragments in arrival order. Finite, not restartable; dropping it
/// cancels the underlying request. Ends after the first `Err`.
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate the full reply for `messages`.
    async fn generate(&self, messages: &[ProviderMessage]) -> Result<String, ProviderError>;

    /// Generate the reply incrementally. Nothing is sent until the stream is polled.
    fn generate_stream(&self, messages: Vec<ProviderMessage>) -> FragmentStream;
}

pub type SharedProvider = Arc<dyn ChatProvider>;
