//! Google Gemini REST client.
//!
//! - `POST {base}/v1beta/models/{model}:generateContent` for full replies
//! - `POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse` for streaming
//!
//! User messages become `contents` entries; system messages are carried in
//! `systemInstruction`. The API key travels as the `key` query parameter.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::provider::sse::SseDecoder;
use crate::provider::{ChatProvider, FragmentStream, ProviderError, ProviderMessage, ProviderRole};

/// Longest slice of an unparseable error body kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

// ─── Wire Types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

impl GenerateContentResponse {
    fn check(&self) -> Result<(), ProviderError> {
        if let Some(err) = &self.error {
            return Err(ProviderError::Api(err.message.clone()));
        }
        if self.candidates.is_empty() {
            if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
                return Err(ProviderError::Api(format!("prompt blocked: {reason}")));
            }
        }
        Ok(())
    }

    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Parse a complete `generateContent` reply.
fn parse_reply(body: &str) -> Result<String, ProviderError> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;
    response.check()?;
    if response.candidates.is_empty() {
        return Err(ProviderError::Api("No candidates in Gemini response".to_string()));
    }
    Ok(response.text())
}

/// Parse one streamed chunk. Chunks without candidates yield an empty fragment.
fn parse_fragment(data: &str) -> Result<String, ProviderError> {
    let response: GenerateContentResponse = serde_json::from_str(data)?;
    response.check()?;
    Ok(response.text())
}

// ─── Client ────────────────────────────────────────────────────────────────

/// Gemini-backed [`ChatProvider`].
pub struct GeminiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// Build the request body for `messages`.
    pub fn build_request_body(&self, messages: &[ProviderMessage]) -> GenerateContentRequest {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for msg in messages {
            let part = Part {
                text: Some(msg.content.clone()),
            };
            match msg.role {
                ProviderRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                ProviderRole::System => system_parts.push(part),
            }
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        }
    }

    fn prepare(
        &self,
        method: &str,
        messages: &[ProviderMessage],
    ) -> Result<reqwest::RequestBuilder, ProviderError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        Ok(self
            .client
            .post(self.endpoint(method))
            .query(&[("key", key)])
            .json(&self.build_request_body(messages)))
    }
}

/// Turn a non-2xx response into a [`ProviderError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    };
    Err(ProviderError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Decode an SSE body into reply fragments, stopping at the first fault.
pub fn decode_fragments(body: BoxStream<'static, reqwest::Result<Bytes>>) -> FragmentStream {
    let state = Some((body, SseDecoder::new(), false));

    stream::unfold(state, |state| async move {
        let (mut body, mut decoder, mut eof) = state?;
        loop {
            if let Some(data) = decoder.next_data() {
                return Some(match parse_fragment(&data) {
                    Ok(text) => (Ok(text), Some((body, decoder, eof))),
                    Err(e) => (Err(e), None),
                });
            }
            if eof {
                return None;
            }
            match body.next().await {
                Some(Ok(bytes)) => decoder.push(&bytes),
                Some(Err(e)) => return Some((Err(ProviderError::from(e)), None)),
                None => {
                    decoder.finish();
                    eof = true;
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn generate(&self, messages: &[ProviderMessage]) -> Result<String, ProviderError> {
        debug!(model = self.config.model, messages = messages.len(), "Gemini generateContent");

        let response = self.prepare("generateContent", messages)?.send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        parse_reply(&body)
    }

    fn generate_stream(&self, messages: Vec<ProviderMessage>) -> FragmentStream {
        debug!(model = self.config.model, messages = messages.len(), "Gemini streamGenerateContent");

        let request = self.prepare("streamGenerateContent", &messages);
        let opened = async move {
            let response = request?.query(&[("alt", "sse")]).send().await?;
            let response = check_status(response).await?;
            Ok::<_, ProviderError>(decode_fragments(response.bytes_stream().boxed()))
        };

        stream::once(opened).try_flatten().boxed()
    }
}
