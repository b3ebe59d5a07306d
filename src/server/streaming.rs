//! SSE (Server-Sent Events) streaming for chat replies.
//!
//! Re-frames provider fragments as OpenAI `chat.completion.chunk` events:
//!
//! ```text
//! data: {.. "delta": {"role": "assistant"}, "finish_reason": null}
//! data: {.. "delta": {"role": "assistant", "content": "..."}, "finish_reason": null}   (per fragment)
//! data: {.. "delta": {}, "finish_reason": "stop"}                                    (or the error chunk)
//! data: [DONE]
//! ```
//!
//! A provider fault ends the relay with a chunk carrying an `error` field.
//! `[DONE]` is always the last event.

use std::convert::Infallible;

use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::provider::FragmentStream;
use crate::server::chat::ChatCall;

/// Streaming chat completion chunk (OpenAI-compatible).
#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChunkChoice {
    pub index: usize,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChunkDelta {
    fn assistant(content: Option<String>) -> Self {
        Self {
            role: Some("assistant".to_string()),
            content,
        }
    }
}

impl ChatCall {
    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<&str>, error: Option<String>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_string),
            }],
            error,
        }
    }
}

enum Phase {
    Opening(FragmentStream),
    Relaying(FragmentStream),
    Finished,
}

/// Chunks for one streamed reply, excluding the `[DONE]` terminator.
pub fn completion_chunks(
    call: ChatCall,
    fragments: FragmentStream,
) -> impl Stream<Item = ChatCompletionChunk> + Send + 'static {
    stream::unfold((Phase::Opening(fragments), call), |(phase, call)| async move {
        match phase {
            Phase::Opening(fragments) => {
                let chunk = call.chunk(ChunkDelta::assistant(None), None, None);
                Some((chunk, (Phase::Relaying(fragments), call)))
            }
            Phase::Relaying(mut fragments) => loop {
                match fragments.next().await {
                    Some(Ok(text)) if text.is_empty() => continue,
                    Some(Ok(text)) => {
                        let chunk = call.chunk(ChunkDelta::assistant(Some(text)), None, None);
                        return Some((chunk, (Phase::Relaying(fragments), call)));
                    }
                    Some(Err(e)) => {
                        warn!(chat_id = call.id, error = %e, "Provider failed mid-stream");
                        let chunk = call.chunk(ChunkDelta::default(), Some("stop"), Some(e.to_string()));
                        return Some((chunk, (Phase::Finished, call)));
                    }
                    None => {
                        debug!(chat_id = call.id, "Stream complete");
                        let chunk = call.chunk(ChunkDelta::default(), Some("stop"), None);
                        return Some((chunk, (Phase::Finished, call)));
                    }
                }
            },
            Phase::Finished => None,
        }
    })
}

/// Convert a fragment stream into SSE events, `[DONE]` last.
pub fn completion_to_sse_stream(
    call: ChatCall,
    fragments: FragmentStream,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    completion_chunks(call, fragments)
        .map(|chunk| {
            let data = serde_json::to_string(&chunk).unwrap_or_default();
            Ok(Event::default().data(data))
        })
        // Append the [DONE] sentinel after all events.
        .chain(tokio_stream::once(Ok(Event::default().data("[DONE]"))))
}

/// The `text/event-stream` response for a streamed reply.
pub fn sse_response(call: ChatCall, fragments: FragmentStream) -> Response {
    let sse = Sse::new(completion_to_sse_stream(call, fragments));
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        sse,
    )
        .into_response()
}
