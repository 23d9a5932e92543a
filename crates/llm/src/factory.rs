//! Generation provider factory.
//!
//! Resolves a provider name from configuration into a concrete `LlmClient`.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use civic_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// Create a generation client for `provider`.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key (required for OpenAI)
/// * `timeout` - Request timeout; a stalled provider surfaces as `AppError::Llm`
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required secret
/// is missing, and `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL);
            let client = OllamaClient::with_options(base_url, timeout)?;
            Ok(Arc::new(client))
        }
        Some(ProviderType::OpenAI) => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(crate::providers::openai::DEFAULT_OPENAI_URL);
            let client = OpenAiClient::new(api_key, base_url, timeout)?;
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
