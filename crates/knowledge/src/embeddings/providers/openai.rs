//! OpenAI embeddings provider (`/v1/embeddings`).

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use civic_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}

/// OpenAI embedding provider. One request per batch.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    /// Sent as `dimensions`; only the text-embedding-3 family can shorten vectors
    requested_dimensions: Option<usize>,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                .map_err(|e| AppError::Config(format!("invalid OpenAI API key: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Embedding(format!("failed to build OpenAI HTTP client: {}", e)))?;

        let base_url = config.endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_URL);

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            requested_dimensions: config
                .model
                .starts_with("text-embedding-3")
                .then_some(config.dimensions),
        })
    }

    fn request<'a>(&'a self, texts: &'a [String]) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        }
    }

    /// Put vectors back in input order and check their shape.
    fn order_and_check(&self, expected: usize, mut data: Vec<EmbeddingData>) -> AppResult<Vec<Vec<f64>>> {
        if data.len() != expected {
            return Err(AppError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                data.len(),
                expected
            )));
        }

        data.sort_by_key(|d| d.index);

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(AppError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: d.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Requesting {} embeddings from OpenAI ({})", texts.len(), self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request(texts))
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("failed to call OpenAI embeddings: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Embedding(format!(
                "OpenAI embeddings returned {}: {}",
                status, text
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("failed to parse OpenAI embeddings: {}", e)))?;

        self.order_and_check(texts.len(), body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimensions: usize) -> OpenAiProvider {
        let config = EmbeddingConfig {
            dimensions,
            ..EmbeddingConfig::for_provider("openai").unwrap()
        };
        OpenAiProvider::new(&config, "sk-test").unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(provider(3).endpoint, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_request_carries_configured_dimensions() {
        let texts = vec!["子育て支援".to_string()];
        let provider = provider(1536);
        let body = serde_json::to_value(provider.request(&texts)).unwrap();

        assert_eq!(body["model"], "text-embedding-3-large");
        assert_eq!(body["input"][0], "子育て支援");
        assert_eq!(body["dimensions"], 1536);
    }

    #[test]
    fn test_request_omits_dimensions_for_fixed_size_models() {
        let config = EmbeddingConfig {
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            ..EmbeddingConfig::for_provider("openai").unwrap()
        };
        let provider = OpenAiProvider::new(&config, "sk-test").unwrap();
        let texts = vec!["x".to_string()];
        let body = serde_json::to_value(provider.request(&texts)).unwrap();

        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn test_response_reordered_by_index() {
        let body: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[
                {"index":1,"embedding":[0.0,1.0]},
                {"index":0,"embedding":[1.0,0.0]}
            ]}"#,
        )
        .unwrap();

        let vectors = provider(2).order_and_check(2, body.data).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let data = vec![EmbeddingData {
            index: 0,
            embedding: vec![0.5; 4],
        }];
        let err = provider(3).order_and_check(1, data).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_missing_vectors_rejected() {
        let result = provider(2).order_and_check(2, Vec::new());
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
