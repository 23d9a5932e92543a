//! OpenAI chat completions provider.
//!
//! Streaming uses server-sent events: every `data:` line carries a JSON delta
//! and the literal `data: [DONE]` ends the reply.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use civic_core::{AppError, AppResult};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatStreamEvent {
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

/// OpenAI chat completions client.
pub struct OpenAiClient {
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Build a client with bearer auth baked into the default headers.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("missing OpenAI API key".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| AppError::Config(format!("invalid OpenAI API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Llm(format!("failed to build OpenAI HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }

    fn chat_request<'a>(&self, request: &'a LlmRequest, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest<'_>) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("failed to call OpenAI chat completions: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Llm(format!("OpenAI returned {}: {}", status, text)));
        }

        Ok(response)
    }
}

/// Convert one SSE line into a stream fragment; `None` for lines carrying nothing.
fn parse_event(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let payload = line.strip_prefix("data:")?.trim();

    if payload == "[DONE]" {
        return Some(Ok(LlmStreamChunk::finished(None)));
    }

    let event: ChatStreamEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(AppError::Llm(format!(
                "Failed to parse OpenAI stream event: {}",
                e
            ))))
        }
    };

    let content: String = event
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();

    if content.is_empty() {
        None
    } else {
        Some(Ok(LlmStreamChunk::text(content)))
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to OpenAI");

        let response = self.post(&self.chat_request(request, false)).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("failed to parse OpenAI response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default();
        let usage = parsed
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: parsed.model,
            usage,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming request to OpenAI");
        tracing::debug!("Model: {}", request.model);

        let response = self.post(&self.chat_request(request, true)).await?;

        let stream = super::split_lines(response.bytes_stream()).filter_map(|line| async move {
            match line {
                Ok(line) => parse_event(&line),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(stream))
    }
}
