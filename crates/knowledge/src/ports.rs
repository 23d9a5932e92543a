//! Collaborator ports consumed by the pipelines.
//!
//! The highlight job, the embedding job and the retriever are written against
//! these traits only; [`crate::store::MemoryCorpus`] and
//! [`crate::vector_index::InMemoryVectorIndex`] are the bundled bindings.

use crate::types::{ChunkId, EmbeddingRecord, Highlight, Page, Speech, SpeechChunk};
use civic_core::AppResult;

/// Read access to speeches and their chunks.
#[async_trait::async_trait]
pub trait SpeechesSource: Send + Sync {
    /// List speeches, `page` is 1-based.
    async fn list(&self, page: usize, size: usize) -> AppResult<Page<Speech>>;

    /// Fetch the chunks whose ids appear in `ids`. Unknown ids are skipped;
    /// the result order is not guaranteed to follow `ids`.
    async fn get_chunks_by_ids(&self, ids: &[ChunkId]) -> AppResult<Vec<SpeechChunk>>;

    /// Every stored chunk.
    async fn get_all_chunks(&self) -> AppResult<Vec<SpeechChunk>>;
}

/// Storage for the published highlight set.
#[async_trait::async_trait]
pub trait HighlightsSink: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Highlight>>;

    /// Insert, or replace the highlight with the same `cluster_label`.
    async fn upsert(&self, highlight: Highlight) -> AppResult<()>;

    async fn clear(&self) -> AppResult<()>;
}

/// Bulk read of stored embeddings, for clustering.
#[async_trait::async_trait]
pub trait EmbeddingsSource: Send + Sync {
    async fn get_all_embeddings(&self) -> AppResult<Vec<EmbeddingRecord>>;
}
