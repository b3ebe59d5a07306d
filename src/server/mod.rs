//! HTTP server providing the bridge API.
//!
//! - [`router`]: Routes, shared state and action dispatch
//! - [`openai_api`]: Request/response types
//! - [`chat`]: Chat adapter between the API and the provider
//! - [`streaming`]: SSE streaming for incremental replies
//! - [`error`]: Error envelopes

pub mod chat;
pub mod error;
pub mod openai_api;
pub mod router;
pub mod streaming;
