//! Batch embedding job.
//!
//! Fetches chunks batch by batch, embeds each one and stores the vector. A
//! failing chunk or a failing batch fetch is logged and skipped; the run keeps
//! going.

use crate::embeddings::EmbeddingProvider;
use crate::ports::SpeechesSource;
use crate::progress::ProgressReporter;
use crate::types::ChunkId;
use crate::vector_index::VectorIndex;
use civic_core::config::EmbeddingSettings;
use std::time::Duration;

/// Batching and pacing for [`EmbeddingJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Chunk ids fetched per source call; 0 is treated as 1
    pub batch_size: usize,

    /// Pause after every chunk, in milliseconds; 0 disables pacing
    pub rate_limit_ms: u64,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            rate_limit_ms: 0,
        }
    }
}

impl From<EmbeddingSettings> for EmbedOptions {
    fn from(settings: EmbeddingSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            rate_limit_ms: settings.rate_limit_ms,
        }
    }
}

/// Outcome of one job run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedStats {
    /// Chunk ids requested
    pub total: usize,

    /// Chunks embedded and stored
    pub processed: usize,

    /// Chunks that failed, or whose batch could not be fetched
    pub failed: usize,

    /// Ids the source did not return
    pub missing: usize,
}

/// Embeds chunks from a speeches source into a vector index.
pub struct EmbeddingJob<'a> {
    source: &'a dyn SpeechesSource,
    index: &'a dyn VectorIndex,
    provider: &'a dyn EmbeddingProvider,
    options: EmbedOptions,
}

impl<'a> EmbeddingJob<'a> {
    pub fn new(
        source: &'a dyn SpeechesSource,
        index: &'a dyn VectorIndex,
        provider: &'a dyn EmbeddingProvider,
        options: EmbedOptions,
    ) -> Self {
        Self {
            source,
            index,
            provider,
            options,
        }
    }

    /// Embed every chunk in `chunk_ids`, overwriting existing vectors.
    pub async fn run(&self, chunk_ids: &[ChunkId], progress: &ProgressReporter) -> EmbedStats {
        let total = chunk_ids.len();
        let mut stats = EmbedStats {
            total,
            ..EmbedStats::default()
        };

        tracing::info!(
            "Embedding {} chunks with {}/{} (batch size {}, rate limit {}ms)",
            total,
            self.provider.provider_name(),
            self.provider.model_name(),
            self.options.batch_size,
            self.options.rate_limit_ms
        );

        for batch in chunk_ids.chunks(self.options.batch_size.max(1)) {
            let handled = (stats.processed + stats.failed + stats.missing) as u64;
            progress.fetch(handled, total as u64, batch.len());

            let chunks = match self.source.get_chunks_by_ids(batch).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!("Failed to fetch batch of {} chunks: {}", batch.len(), e);
                    stats.failed += batch.len();
                    continue;
                }
            };

            stats.missing += batch.len().saturating_sub(chunks.len());

            for chunk in chunks {
                let result = match self.provider.embed(&chunk.text).await {
                    Ok(vector) => self.index.upsert(chunk.id, vector).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        stats.processed += 1;
                        let handled = (stats.processed + stats.failed + stats.missing) as u64;
                        progress.embed(handled, total as u64, chunk.id, self.provider.model_name());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to embed chunk {}: {}", chunk.id, e);
                        stats.failed += 1;
                        let handled = (stats.processed + stats.failed + stats.missing) as u64;
                        progress.skip(handled, total as u64, chunk.id, &e.to_string());
                    }
                }

                if self.options.rate_limit_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.options.rate_limit_ms)).await;
                }
            }
        }

        tracing::info!(
            "Embedding finished: {} embedded, {} failed, {} missing of {}",
            stats.processed,
            stats.failed,
            stats.missing,
            stats.total
        );

        stats
    }
}
