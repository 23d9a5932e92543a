//! JSON snapshot of the corpus shared by the batch jobs.

use crate::embeddings::EmbeddingProvider;
use crate::ports::EmbeddingsSource;
use crate::store::MemoryCorpus;
use crate::types::{EmbeddingRecord, Highlight, Speech, SpeechChunk};
use crate::vector_index::InMemoryVectorIndex;
use civic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Everything the jobs persist between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusSnapshot {
    #[serde(default)]
    pub speeches: Vec<Speech>,

    #[serde(default)]
    pub chunks: Vec<SpeechChunk>,

    #[serde(default)]
    pub embeddings: Vec<EmbeddingRecord>,

    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl CorpusSnapshot {
    /// Read a snapshot, or an empty one if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!("No corpus snapshot at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Store(format!("Failed to read corpus snapshot {:?}: {}", path, e))
        })?;
        let snapshot: Self = serde_json::from_str(&contents)?;

        tracing::debug!(
            "Loaded corpus snapshot: {} speeches, {} chunks, {} embeddings, {} highlights",
            snapshot.speeches.len(),
            snapshot.chunks.len(),
            snapshot.embeddings.len(),
            snapshot.highlights.len()
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            AppError::Store(format!("Failed to write corpus snapshot {:?}: {}", path, e))
        })?;

        tracing::debug!("Saved corpus snapshot to {:?}", path);
        Ok(())
    }

    /// Capture the current state of a corpus and its index.
    pub fn capture(corpus: &MemoryCorpus, index: &InMemoryVectorIndex) -> AppResult<Self> {
        Ok(Self {
            speeches: corpus.speeches()?,
            chunks: corpus.chunks()?,
            embeddings: index.records()?,
            highlights: corpus.highlights()?,
        })
    }

    /// Rebuild the in-memory corpus and vector index.
    pub fn restore(
        self,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<(MemoryCorpus, InMemoryVectorIndex)> {
        let index = InMemoryVectorIndex::from_records(provider, self.embeddings)?;
        let corpus = MemoryCorpus::from_parts(self.speeches, self.chunks, self.highlights);
        Ok((corpus, index))
    }
}

#[async_trait::async_trait]
impl EmbeddingsSource for CorpusSnapshot {
    async fn get_all_embeddings(&self) -> AppResult<Vec<EmbeddingRecord>> {
        Ok(self.embeddings.clone())
    }
}
