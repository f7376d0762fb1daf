//! Conversion client: stream the model response and concatenate it.
//!
//! The wire protocol lives behind the [`ChatBackend`] trait so tests and
//! embedders can substitute a scripted or cached transport; the default
//! [`OpenAiBackend`] speaks the OpenAI-compatible `chat/completions`
//! protocol with `stream: true` against any conforming endpoint.
//!
//! The streamed response is consumed incrementally but only concatenated —
//! no chunk-level persistence, no retry, no cancellation hook mid-stream.
//! Each delta is reported through the `on_delta` callback so callers can
//! surface progress, then appended to the accumulator. An error from the
//! endpoint propagates as [`Doc2MdError::GenerationFailed`] and is fatal.

use crate::error::Doc2MdError;
use crate::pipeline::assemble::MessagePart;
use futures::future::BoxFuture;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Everything a backend needs to produce one completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System message content.
    pub system: String,
    /// Ordered user-message parts (text and images).
    pub parts: Vec<MessagePart>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Delta callback invoked once per streamed text fragment, in order.
pub type DeltaFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// A transport that turns a [`GenerationRequest`] into concatenated text.
///
/// Implementations must call `on_delta` for every text fragment in stream
/// order and return the full concatenation. The default implementation is
/// [`OpenAiBackend`]; tests inject scripted backends through
/// [`crate::config::ConversionConfigBuilder::backend`].
pub trait ChatBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a GenerationRequest,
        on_delta: DeltaFn<'a>,
    ) -> BoxFuture<'a, Result<String, Doc2MdError>>;
}

/// OpenAI-compatible streaming backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let content: Vec<serde_json::Value> = request
            .parts
            .iter()
            .map(|part| match part {
                MessagePart::Text(text) => json!({
                    "type": "text",
                    "text": text,
                }),
                MessagePart::Image { data, mime_type } => json!({
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{mime_type};base64,{data}"),
                    },
                }),
            })
            .collect();

        json!({
            "model": request.model,
            "stream": true,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": content },
            ],
        })
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete<'a>(
        &'a self,
        request: &'a GenerationRequest,
        on_delta: DeltaFn<'a>,
    ) -> BoxFuture<'a, Result<String, Doc2MdError>> {
        Box::pin(async move {
            let url = format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            );
            debug!("Streaming completion from {} ({})", url, request.model);

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&self.request_body(request))
                .send()
                .await
                .map_err(|e| Doc2MdError::GenerationFailed {
                    detail: e.to_string(),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Doc2MdError::GenerationFailed {
                    detail: format!("HTTP {status}: {body}"),
                });
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut markdown = String::new();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.map_err(|e| Doc2MdError::GenerationFailed {
                    detail: format!("stream interrupted: {e}"),
                })?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim_end_matches('\r').to_string();
                    buffer.drain(..=newline);

                    if let Some(delta) = parse_sse_line(&line)? {
                        on_delta(&delta);
                        markdown.push_str(&delta);
                    }
                }
            }

            debug!("Stream complete: {} chars", markdown.len());
            Ok(markdown)
        })
    }
}

/// Parse one server-sent-events line into its text delta.
///
/// Returns `Ok(None)` for keep-alive comments, empty lines, structural
/// chunks without content (role announcements, finish markers), and the
/// terminal `[DONE]` sentinel. In-band endpoint errors become
/// `GenerationFailed`.
fn parse_sse_line(line: &str) -> Result<Option<String>, Doc2MdError> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();

    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    if let Ok(err) = serde_json::from_str::<StreamError>(payload) {
        return Err(Doc2MdError::GenerationFailed {
            detail: err.error.message,
        });
    }

    let chunk: StreamChunk =
        serde_json::from_str(payload).map_err(|e| Doc2MdError::GenerationFailed {
            detail: format!("malformed stream chunk: {e}"),
        })?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty()))
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    error: StreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}
