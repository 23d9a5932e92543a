//! Vector index abstraction for speech chunks.
//!
//! Stores one embedding per chunk id and answers top-k cosine queries by text.

use crate::embeddings::EmbeddingProvider;
use crate::ports::EmbeddingsSource;
use crate::types::{ChunkId, EmbeddingRecord, SimilarityResult};
use civic_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite the vector for `chunk_id`.
    async fn upsert(&self, chunk_id: ChunkId, embedding: Vec<f64>) -> AppResult<()>;

    /// Embed `text` and return at most `k` hits by descending cosine similarity.
    ///
    /// The query is embedded even when the index holds nothing.
    async fn query_similar(&self, text: &str, k: usize) -> AppResult<Vec<SimilarityResult>>;
}

/// Cosine similarity of two vectors.
///
/// Returns exactly `0.0` when either vector has zero norm.
///
/// # Errors
/// `AppError::DimensionMismatch` when the lengths differ.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> AppResult<f64> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / denominator)
}

#[derive(Debug, Default)]
struct Entries {
    ids: Vec<ChunkId>,
    vectors: Vec<Vec<f64>>,
    positions: HashMap<ChunkId, usize>,
}

impl Entries {
    fn dimensions(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}

/// In-process index over a brute-force scan.
///
/// Entries keep their first insertion position, so equal scores rank in
/// insertion order. All vectors must share the dimension of the first one.
pub struct InMemoryVectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Entries>,
}

impl InMemoryVectorIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Rebuild an index from stored records, in record order.
    pub fn from_records(
        provider: Arc<dyn EmbeddingProvider>,
        records: Vec<EmbeddingRecord>,
    ) -> AppResult<Self> {
        let index = Self::new(provider);
        {
            let mut entries = index.write()?;
            for record in records {
                insert(&mut entries, record.chunk_id, record.embedding)?;
            }
        }
        Ok(index)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> AppResult<usize> {
        Ok(self.read()?.ids.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Shared dimension of the stored vectors, once anything is stored.
    pub fn dimensions(&self) -> AppResult<Option<usize>> {
        Ok(self.read()?.dimensions())
    }

    /// All records in insertion order.
    pub fn records(&self) -> AppResult<Vec<EmbeddingRecord>> {
        let entries = self.read()?;
        Ok(entries
            .ids
            .iter()
            .zip(&entries.vectors)
            .map(|(id, vector)| EmbeddingRecord::new(*id, vector.clone()))
            .collect())
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, Entries>> {
        self.entries
            .read()
            .map_err(|_| AppError::Store("vector index lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, Entries>> {
        self.entries
            .write()
            .map_err(|_| AppError::Store("vector index lock poisoned".to_string()))
    }
}

fn insert(entries: &mut Entries, chunk_id: ChunkId, embedding: Vec<f64>) -> AppResult<()> {
    if let Some(expected) = entries.dimensions() {
        if embedding.len() != expected {
            return Err(AppError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
    }

    match entries.positions.get(&chunk_id) {
        Some(&pos) => entries.vectors[pos] = embedding,
        None => {
            entries.positions.insert(chunk_id, entries.ids.len());
            entries.ids.push(chunk_id);
            entries.vectors.push(embedding);
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, chunk_id: ChunkId, embedding: Vec<f64>) -> AppResult<()> {
        let mut entries = self.write()?;
        insert(&mut entries, chunk_id, embedding)
    }

    async fn query_similar(&self, text: &str, k: usize) -> AppResult<Vec<SimilarityResult>> {
        let query = self.provider.embed(text).await?;

        let entries = self.read()?;
        if entries.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results = entries
            .ids
            .iter()
            .zip(&entries.vectors)
            .map(|(id, vector)| {
                cosine_similarity(&query, vector).map(|score| SimilarityResult {
                    chunk_id: *id,
                    score,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        // Stable: equal scores keep insertion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        tracing::debug!(
            "Vector query over {} entries returned {} hits",
            entries.ids.len(),
            results.len()
        );

        Ok(results)
    }
}

#[async_trait::async_trait]
impl EmbeddingsSource for InMemoryVectorIndex {
    async fn get_all_embeddings(&self) -> AppResult<Vec<EmbeddingRecord>> {
        self.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;

    /// Provider that always returns the same vector.
    #[derive(Debug)]
    struct FixedProvider(Vec<f64>);

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f64>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    fn index_with_query(query: Vec<f64>) -> InMemoryVectorIndex {
        InMemoryVectorIndex::new(Arc::new(FixedProvider(query)))
    }

    #[test]
    fn test_cosine_identical() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_query_orders_by_score() {
        let index = index_with_query(vec![1.0, 0.0]);
        index.upsert(1, vec![0.0, 1.0]).await.unwrap();
        index.upsert(2, vec![1.0, 0.0]).await.unwrap();
        index.upsert(3, vec![1.0, 1.0]).await.unwrap();

        let results = index.query_similar("予算", 2).await.unwrap();
        let ids: Vec<ChunkId> = results.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!((results[0].score - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let index = index_with_query(vec![1.0, 0.0]);
        index.upsert(30, vec![2.0, 0.0]).await.unwrap();
        index.upsert(10, vec![1.0, 0.0]).await.unwrap();
        index.upsert(20, vec![5.0, 0.0]).await.unwrap();

        let ids: Vec<ChunkId> = index
            .query_similar("x", 10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.chunk_id)
            .collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let index = index_with_query(vec![1.0, 0.0]);
        index.upsert(1, vec![0.0, 1.0]).await.unwrap();
        index.upsert(2, vec![0.0, 1.0]).await.unwrap();
        index.upsert(1, vec![1.0, 0.0]).await.unwrap();

        assert_eq!(index.len().unwrap(), 2);
        let results = index.query_similar("x", 1).await.unwrap();
        assert_eq!(results[0].chunk_id, 1);

        let records = index.records().unwrap();
        assert_eq!(records[0], EmbeddingRecord::new(1, vec![1.0, 0.0]));
    }

    #[tokio::test]
    async fn test_upsert_rejects_other_dimension() {
        let index = index_with_query(vec![1.0, 0.0]);
        index.upsert(1, vec![1.0, 0.0]).await.unwrap();

        let err = index.upsert(2, vec![1.0, 0.0, 0.0]).await.unwrap_err();
        assert!(matches!(err, AppError::DimensionMismatch { .. }));
        assert_eq!(index.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_index_still_embeds() {
        let provider = Arc::new(MockProvider::new(16));
        let index = InMemoryVectorIndex::new(provider.clone());

        let results = index.query_similar("子育て", 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_error() {
        let index = index_with_query(vec![1.0, 0.0, 0.0]);
        index.upsert(1, vec![1.0, 0.0]).await.unwrap();

        let result = index.query_similar("x", 1).await;
        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_from_records_and_embeddings_source() {
        let records = vec![
            EmbeddingRecord::new(5, vec![0.1, 0.2]),
            EmbeddingRecord::new(6, vec![0.3, 0.4]),
        ];
        let index =
            InMemoryVectorIndex::from_records(Arc::new(FixedProvider(vec![1.0, 0.0])), records.clone())
                .unwrap();

        assert_eq!(index.dimensions().unwrap(), Some(2));
        assert_eq!(index.get_all_embeddings().await.unwrap(), records);
    }
}
