//! Mock embedding provider using character-bigram hashing.

use crate::embeddings::provider::EmbeddingProvider;
use civic_core::AppResult;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock provider for testing and offline runs.
///
/// Japanese text has no word boundaries, so every character bigram (and each
/// single character at half weight) is hashed into a bucket. Texts sharing
/// vocabulary therefore land close together. Output is unit-normalised;
/// blank text maps to the zero vector.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, gram: &[char]) -> usize {
        // FNV-1a over the UTF-8 bytes
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut buf = [0u8; 4];
        for c in gram {
            for b in c.encode_utf8(&mut buf).bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
        }
        (hash % self.dimensions as u64) as usize
    }

    fn generate_mock_embedding(&self, text: &str) -> Vec<f64> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();

        for c in &chars {
            embedding[self.bucket(std::slice::from_ref(c))] += 0.5;
        }
        for pair in chars.windows(2) {
            embedding[self.bucket(pair)] += 1.0;
        }

        let norm: f64 = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "bigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f64>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| self.generate_mock_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::cosine_similarity;

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[tokio::test]
    async fn test_mock_provider_embed_single() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("保育園を増やします").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 1e-9);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_embed_batch() {
        let provider = MockProvider::new(64);
        let texts = vec![
            "道路整備".to_string(),
            "公園の管理".to_string(),
            "a".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 64);
            assert!((norm(embedding) - 1.0).abs() < 1e-9);
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_deterministic() {
        let provider = MockProvider::new(384);
        let embedding1 = provider.embed("決定的なテスト").await.unwrap();
        let embedding2 = provider.embed("決定的なテスト").await.unwrap();
        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(384);
        let query = provider.embed("子育て支援").await.unwrap();
        let related = provider.embed("子育て支援を拡充します").await.unwrap();
        let unrelated = provider.embed("道路の舗装工事").await.unwrap();

        let related_score = cosine_similarity(&query, &related).unwrap();
        let unrelated_score = cosine_similarity(&query, &unrelated).unwrap();
        assert!(related_score > unrelated_score);
    }

    #[tokio::test]
    async fn test_mock_provider_empty_text() {
        let provider = MockProvider::new(32);
        let embedding = provider.embed("  ").await.unwrap();

        assert_eq!(embedding.len(), 32);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
