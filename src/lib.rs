//! gemini-bridge: OpenAI-compatible HTTP bridge to Google Gemini.
//!
//! Accepts chat requests in the OpenAI shape (plus an action-dispatched
//! `POST /api` envelope), forwards them to Gemini, and returns completion
//! envelopes or SSE chunk streams. Also keeps an in-memory store of user
//! feedback ratings.

pub mod clock;
pub mod config;
pub mod feedback;
pub mod provider;
pub mod server;
