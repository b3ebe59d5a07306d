//! Chat adapter: generic messages in, OpenAI envelopes out.
//!
//! Only `user` and `system` messages reach the provider; every other role
//! is dropped without error. Usage figures are character counts over the
//! request as received, dropped messages included.

use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

use crate::clock;
use crate::provider::{ChatProvider, ProviderMessage};
use crate::server::error::{ApiError, MESSAGES_REQUIRED};
use crate::server::openai_api::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRequest, Role,
    Usage, DEFAULT_MODEL,
};
use crate::server::streaming::sse_response;

/// Identity of one chat response, shared by every chunk it emits.
#[derive(Debug, Clone)]
pub struct ChatCall {
    /// `chatcmpl-<epoch millis>`.
    pub id: String,
    /// Epoch seconds.
    pub created: u64,
    /// Model name echoed back to the client.
    pub model: String,
}

impl ChatCall {
    pub fn start(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", clock::epoch_millis()),
            created: clock::epoch_secs(),
            model: model.into(),
        }
    }
}

/// The parts of a request the adapter needs, from either API flavour.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub messages: Option<Vec<ChatMessage>>,
    pub model: Option<String>,
    pub stream: bool,
}

impl From<ChatRequest> for ChatInput {
    fn from(req: ChatRequest) -> Self {
        Self {
            messages: req.messages,
            model: req.model,
            stream: req.stream.unwrap_or(false),
        }
    }
}

impl From<ChatCompletionRequest> for ChatInput {
    fn from(req: ChatCompletionRequest) -> Self {
        Self {
            messages: req.messages,
            model: req.model,
            stream: req.stream.unwrap_or(false),
        }
    }
}

/// Translate to provider messages, dropping roles the provider is not given.
pub fn to_provider_messages(messages: &[ChatMessage]) -> Vec<ProviderMessage> {
    messages
        .iter()
        .filter_map(|msg| match msg.role {
            Role::User => Some(ProviderMessage::user(msg.content.clone())),
            Role::System => Some(ProviderMessage::system(msg.content.clone())),
            Role::Assistant | Role::Other => None,
        })
        .collect()
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Character-count usage for a reply to `messages`.
pub fn usage_for(messages: &[ChatMessage], reply: &str) -> Usage {
    let prompt_tokens = messages.iter().map(|m| char_count(&m.content)).sum();
    let completion_tokens = char_count(reply);
    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}

/// Wrap a full reply in a `chat.completion` envelope.
pub fn completion_response(
    call: ChatCall,
    messages: &[ChatMessage],
    reply: String,
) -> ChatCompletionResponse {
    let usage = usage_for(messages, &reply);
    ChatCompletionResponse {
        id: call.id,
        object: "chat.completion".to_string(),
        created: call.created,
        model: call.model,
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: Role::Assistant,
                content: reply,
            },
            finish_reason: "stop".to_string(),
        }],
        usage,
    }
}

/// Run a chat request against `provider`.
///
/// Returns a JSON completion, or an SSE response when `input.stream` is set.
/// Provider faults before the response starts surface as
/// [`ApiError::Internal`]; faults during a stream are reported in-band.
pub async fn run_chat(provider: &dyn ChatProvider, input: ChatInput) -> Result<Response, ApiError> {
    let messages = input
        .messages
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MESSAGES_REQUIRED.to_string()))?;

    let call = ChatCall::start(input.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()));
    let provider_messages = to_provider_messages(&messages);

    info!(
        chat_id = call.id,
        model = call.model,
        messages = messages.len(),
        forwarded = provider_messages.len(),
        stream = input.stream,
        "Chat request"
    );
    if provider_messages.len() < messages.len() {
        debug!(
            chat_id = call.id,
            dropped = messages.len() - provider_messages.len(),
            "Dropped messages with roles other than user/system"
        );
    }

    if input.stream {
        let fragments = provider.generate_stream(provider_messages);
        return Ok(sse_response(call, fragments));
    }

    let reply = provider.generate(&provider_messages).await?;
    let response = completion_response(call, &messages, reply);
    debug!(
        chat_id = response.id,
        total_tokens = response.usage.total_tokens,
        "Chat completion"
    );
    Ok(Json(response).into_response())
}
