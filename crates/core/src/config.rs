//! Configuration management for Civic Lens.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (.civic/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.civic/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the workspace knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .civic/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider (e.g., "openai", "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider (e.g., "openai", "ollama", "mock")
    pub embedding_provider: String,

    /// API key override for keyed providers
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Provider configurations
    pub llm: Option<LlmConfig>,

    /// Clustering settings for the highlight job
    pub highlights: HighlightSettings,

    /// Query-time retrieval settings
    pub retrieval: RetrievalSettings,

    /// Batch embedding job settings
    pub embedding: EmbeddingSettings,

    /// Sampling settings for answer generation
    pub generation: GenerationSettings,
}

/// Provider section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Embedding model, if configured.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI {
                embedding_model, ..
            }
            | ProviderConfig::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            ProviderConfig::OpenAI { timeout, .. } | ProviderConfig::Ollama { timeout, .. } => {
                *timeout
            }
        }
    }
}

/// K-means settings for highlight generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSettings {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            k: default_k(),
            seed: default_seed(),
        }
    }
}

fn default_k() -> usize {
    6
}

fn default_seed() -> u64 {
    42
}

/// Retrieval settings for the answer pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

/// Sampling settings passed to the generation provider. Unset values are
/// left to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(rename = "maxTokens", default)]
    pub max_tokens: Option<u32>,
}

/// Settings for the batch embedding job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(rename = "batchSize", default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(rename = "rateLimitMs", default)]
    pub rate_limit_ms: u64,

    /// Expected embedding dimension; provider default when absent
    #[serde(default)]
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_ms: 0,
            dimensions: None,
        }
    }
}

fn default_batch_size() -> usize {
    100
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    highlights: Option<HighlightSettings>,
    retrieval: Option<RetrievalSettings>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            embedding_provider: "openai".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: None,
            highlights: HighlightSettings::default(),
            retrieval: RetrievalSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CIVIC_WORKSPACE`: Override workspace path
    /// - `CIVIC_CONFIG`: Path to config file
    /// - `CIVIC_PROVIDER`: Generation provider
    /// - `CIVIC_MODEL`: Generation model
    /// - `CIVIC_EMBEDDING_PROVIDER`: Embedding provider
    /// - `CIVIC_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use civic_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CIVIC_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CIVIC_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.civic_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CIVIC_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CIVIC_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("CIVIC_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        config.api_key = std::env::var("CIVIC_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(highlights) = config_file.highlights {
            result.highlights = highlights;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = match provider_config {
                    ProviderConfig::OpenAI { model, .. } => model.clone(),
                    ProviderConfig::Ollama { model, .. } => model.clone(),
                };
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(embedding_provider) = embedding_provider {
            self.embedding_provider = embedding_provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .civic directory.
    pub fn civic_dir(&self) -> PathBuf {
        self.workspace.join(".civic")
    }

    /// Path of the corpus snapshot shared by the batch jobs.
    pub fn corpus_path(&self) -> PathBuf {
        self.civic_dir().join("corpus.json")
    }

    /// Ensure the .civic directory exists.
    pub fn ensure_civic_dir(&self) -> AppResult<()> {
        let civic_dir = self.civic_dir();
        if !civic_dir.exists() {
            std::fs::create_dir_all(&civic_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .civic directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get a provider's configuration block.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Resolve the API key for a provider.
    ///
    /// `CIVIC_API_KEY` wins, then the provider's `apiKeyEnv`, then `OPENAI_API_KEY`
    /// for the OpenAI provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(&api_key_env) {
                return Some(key);
            }
        }

        if provider == "openai" {
            return std::env::var("OPENAI_API_KEY").ok();
        }

        None
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        for provider in [&self.provider, &self.embedding_provider] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }

            if provider == "openai" && self.resolve_api_key(provider).is_none() {
                return Err(AppError::Config(
                    "API key not found for provider 'openai' (set OPENAI_API_KEY or CIVIC_API_KEY)"
                        .to_string(),
                ));
            }
        }

        if self.provider == "mock" {
            return Err(AppError::Config(
                "The mock provider only supports embeddings".to_string(),
            ));
        }

        if self.highlights.k == 0 {
            return Err(AppError::Config("highlights.k must be at least 1".to_string()));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.highlights, HighlightSettings { k: 6, seed: 42 });
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.embedding.batch_size, 100);
        assert!(!config.verbose);
    }

    #[test]
    fn test_civic_paths() {
        let config = AppConfig::default();
        assert!(config.civic_dir().ends_with(".civic"));
        assert!(config.corpus_path().ends_with(".civic/corpus.json"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            Some("mock".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert_eq!(overridden.embedding_provider, "mock");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  activeEmbeddingProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
      embeddingModel: nomic-embed-text
      timeout: 10
highlights:
  k: 4
  seed: 7
retrieval:
  topK: 3
generation:
  temperature: 0.2
  maxTokens: 800
logging:
  level: debug
  json: true
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.embedding_provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.highlights, HighlightSettings { k: 4, seed: 7 });
        assert_eq!(merged.retrieval.top_k, 3);
        assert_eq!(merged.generation.temperature, Some(0.2));
        assert_eq!(merged.generation.max_tokens, Some(800));
        assert_eq!(merged.log_level, Some("debug".to_string()));
        assert!(merged.log_json);

        let ollama = merged.get_provider_config("ollama").unwrap();
        assert_eq!(ollama.endpoint(), Some("http://localhost:11434"));
        assert_eq!(ollama.embedding_model(), Some("nomic-embed-text"));
        assert_eq!(ollama.timeout_secs(), Some(10));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.embedding_provider = "mock".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_with_explicit_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_k() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.embedding_provider = "ollama".to_string();
        config.highlights.k = 0;
        assert!(config.validate().is_err());
    }
}
