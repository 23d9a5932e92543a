//! In-process corpus: speeches, chunks and the published highlights.

use crate::chunker::chunk_speech;
use crate::ports::{HighlightsSink, SpeechesSource};
use crate::types::{ChunkId, Highlight, Page, Speech, SpeechChunk};
use civic_core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct CorpusData {
    speeches: Vec<Speech>,
    chunks: Vec<SpeechChunk>,
    highlights: Vec<Highlight>,
}

/// Memory-backed [`SpeechesSource`] and [`HighlightsSink`].
#[derive(Debug, Default)]
pub struct MemoryCorpus {
    data: RwLock<CorpusData>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from previously stored records.
    pub fn from_parts(
        speeches: Vec<Speech>,
        chunks: Vec<SpeechChunk>,
        highlights: Vec<Highlight>,
    ) -> Self {
        Self {
            data: RwLock::new(CorpusData {
                speeches,
                chunks,
                highlights,
            }),
        }
    }

    /// Store a speech and its sentence chunks; returns the new chunks.
    ///
    /// Chunk ids continue after the largest stored id.
    ///
    /// # Errors
    /// `AppError::Store` if a speech with the same id is already stored.
    pub fn add_speech(&self, speech: Speech) -> AppResult<Vec<SpeechChunk>> {
        let mut data = self.write()?;

        if data.speeches.iter().any(|s| s.id == speech.id) {
            return Err(AppError::Store(format!(
                "speech {} is already stored",
                speech.id
            )));
        }

        let next_id = data.chunks.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let chunks = chunk_speech(&speech, next_id);

        tracing::debug!(
            "Stored speech {} ({} chunks from id {})",
            speech.id,
            chunks.len(),
            next_id
        );

        data.chunks.extend(chunks.iter().cloned());
        data.speeches.push(speech);
        Ok(chunks)
    }

    pub fn speeches(&self) -> AppResult<Vec<Speech>> {
        Ok(self.read()?.speeches.clone())
    }

    pub fn chunks(&self) -> AppResult<Vec<SpeechChunk>> {
        Ok(self.read()?.chunks.clone())
    }

    pub fn highlights(&self) -> AppResult<Vec<Highlight>> {
        Ok(self.read()?.highlights.clone())
    }

    /// Ids of every stored chunk, in storage order.
    pub fn chunk_ids(&self) -> AppResult<Vec<ChunkId>> {
        Ok(self.read()?.chunks.iter().map(|c| c.id).collect())
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, CorpusData>> {
        self.data
            .read()
            .map_err(|_| AppError::Store("corpus lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, CorpusData>> {
        self.data
            .write()
            .map_err(|_| AppError::Store("corpus lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl SpeechesSource for MemoryCorpus {
    async fn list(&self, page: usize, size: usize) -> AppResult<Page<Speech>> {
        let data = self.read()?;
        let total = data.speeches.len();

        let items = if page == 0 || size == 0 {
            Vec::new()
        } else {
            data.speeches
                .iter()
                .skip((page - 1).saturating_mul(size))
                .take(size)
                .cloned()
                .collect()
        };

        Ok(Page { items, total })
    }

    async fn get_chunks_by_ids(&self, ids: &[ChunkId]) -> AppResult<Vec<SpeechChunk>> {
        let wanted: HashSet<ChunkId> = ids.iter().copied().collect();
        Ok(self
            .read()?
            .chunks
            .iter()
            .filter(|c| wanted.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn get_all_chunks(&self) -> AppResult<Vec<SpeechChunk>> {
        self.chunks()
    }
}

#[async_trait::async_trait]
impl HighlightsSink for MemoryCorpus {
    async fn list(&self) -> AppResult<Vec<Highlight>> {
        self.highlights()
    }

    async fn upsert(&self, highlight: Highlight) -> AppResult<()> {
        let mut data = self.write()?;
        match data
            .highlights
            .iter_mut()
            .find(|h| h.cluster_label == highlight.cluster_label)
        {
            Some(existing) => *existing = highlight,
            None => data.highlights.push(highlight),
        }
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.write()?.highlights.clear();
        Ok(())
    }
}
