//! Generation provider port and request/response types.
//!
//! The answer pipeline sends a system/user prompt pair and consumes the reply
//! as an ordered stream of text fragments.

use civic_core::AppResult;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Generation request: one system prompt plus one user prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// User prompt
    pub prompt: String,

    /// Model identifier (e.g., "gpt-4", "llama3.2")
    pub model: String,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Stream the reply
    #[serde(default)]
    pub stream: bool,
}

impl LlmRequest {
    /// Create a new request with the required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            max_tokens: None,
            temperature: None,
            stream: false,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// One fragment of a streamed reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Whether this is the final fragment
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (final fragment only, when the provider reports them)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

impl LlmStreamChunk {
    /// A content fragment that is not the last one.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
            usage: None,
        }
    }

    /// The terminating fragment.
    pub fn finished(usage: Option<LlmUsage>) -> Self {
        Self {
            content: String::new(),
            done: true,
            usage,
        }
    }
}

/// Ordered stream of reply fragments. A provider failure ends the stream with an `Err`.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Generation provider port.
///
/// Dropping an `LlmStream` before it finishes aborts the underlying request.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g., "openai", "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Perform a streaming completion.
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream>;
}

/// Buffer a stream into the complete reply text.
///
/// Stops at the first `done` fragment; the first error aborts and is returned.
pub async fn collect_stream(mut stream: LlmStream) -> AppResult<String> {
    let mut full = String::new();
    let mut fragments = 0usize;

    while let Some(item) = stream.next().await {
        let chunk = item?;
        if !chunk.content.is_empty() {
            full.push_str(&chunk.content);
            fragments += 1;
        }
        if chunk.done {
            break;
        }
    }

    tracing::debug!("Buffered {} fragments ({} bytes)", fragments, full.len());
    Ok(full)
}
