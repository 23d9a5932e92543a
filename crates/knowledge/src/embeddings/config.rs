//! Embedding configuration types.

use civic_core::config::AppConfig;
use civic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default request timeout for embedding providers.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "mock", "openai", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "bigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EmbeddingConfig {
    /// Built-in defaults for a provider.
    pub fn for_provider(provider: &str) -> AppResult<Self> {
        let (model, dimensions) = match provider {
            "mock" => ("bigram-v1", 384),
            "openai" => ("text-embedding-3-large", 3072),
            "ollama" => ("nomic-embed-text", 768),
            other => {
                return Err(AppError::Embedding(format!(
                    "Unknown embedding provider: '{}'. Supported providers: mock, openai, ollama",
                    other
                )))
            }
        };

        Ok(Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            ..Self::default()
        })
    }

    /// Resolve the active embedding provider from application configuration.
    ///
    /// Provider defaults are overridden by the provider block in config.yaml
    /// (embedding model, endpoint, timeout) and by `embedding.dimensions`.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        let mut resolved = Self::for_provider(&config.embedding_provider)?;

        if let Some(provider_config) = config.get_provider_config(&config.embedding_provider) {
            if let Some(model) = provider_config.embedding_model() {
                resolved.model = model.to_string();
            }
            resolved.endpoint = provider_config.endpoint().map(str::to_string);
            if let Some(timeout) = provider_config.timeout_secs() {
                resolved.timeout_secs = timeout;
            }
        }

        if let Some(dimensions) = config.embedding.dimensions {
            resolved.dimensions = dimensions;
        }

        Ok(resolved)
    }

    /// Check that vectors already stored can be compared with this provider's.
    pub fn check_stored_dimensions(&self, stored: Option<usize>) -> AppResult<()> {
        match stored {
            Some(actual) if actual != self.dimensions => Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual,
            }),
            _ => Ok(()),
        }
    }
}
