//! Question-to-chunks retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::ports::SpeechesSource;
use crate::types::{ChunkId, RetrievedChunk, SpeechChunk};
use crate::vector_index::VectorIndex;
use civic_core::AppResult;
use std::collections::HashMap;

/// Top `k` chunks for `question`, most similar first.
///
/// The question is embedded through `provider` before the index is queried;
/// the index embeds the text itself, so that vector is not reused. An empty
/// hit list returns without touching the speeches source. Ids the source
/// does not return are skipped. Any provider or store failure fails the call.
pub async fn retrieve(
    question: &str,
    k: usize,
    index: &dyn VectorIndex,
    source: &dyn SpeechesSource,
    provider: &dyn EmbeddingProvider,
) -> AppResult<Vec<RetrievedChunk>> {
    provider.embed(question).await?;

    let hits = index.query_similar(question, k).await?;
    if hits.is_empty() {
        tracing::info!("No similar chunks for question");
        return Ok(Vec::new());
    }

    let ids: Vec<ChunkId> = hits.iter().map(|hit| hit.chunk_id).collect();
    let mut by_id: HashMap<ChunkId, SpeechChunk> = source
        .get_chunks_by_ids(&ids)
        .await?
        .into_iter()
        .map(|chunk| (chunk.id, chunk))
        .collect();

    let retrieved: Vec<RetrievedChunk> = hits
        .iter()
        .filter_map(|hit| {
            by_id.remove(&hit.chunk_id).map(|chunk| RetrievedChunk {
                chunk,
                score: hit.score,
            })
        })
        .collect();

    if retrieved.len() < hits.len() {
        tracing::debug!(
            "{} of {} hits had no chunk record",
            hits.len() - retrieved.len(),
            hits.len()
        );
    }

    tracing::info!(
        "Retrieved {} chunks (top score {:.3})",
        retrieved.len(),
        retrieved.first().map(|r| r.score).unwrap_or(0.0)
    );

    Ok(retrieved)
}
