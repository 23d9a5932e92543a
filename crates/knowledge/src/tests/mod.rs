//! Cross-module pipeline tests and the port doubles they share.

mod retrieval;

use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::ports::{HighlightsSink, SpeechesSource};
use crate::store::MemoryCorpus;
use crate::types::{ChunkId, Highlight, Page, SimilarityResult, Speech, SpeechChunk};
use crate::vector_index::VectorIndex;
use chrono::NaiveDate;
use civic_core::{AppError, AppResult};
use civic_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use std::sync::Mutex;

pub(crate) fn speech(id: i64, content: &str) -> Speech {
    Speech {
        id,
        date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        session: "令和6年第2回定例会".to_string(),
        speaker: "池元勝".to_string(),
        content: content.to_string(),
        source_url: format!("https://example.com/minutes/{}", id),
    }
}

/// Corpus with one speech per entry, chunk ids assigned from 1.
pub(crate) fn corpus_with(contents: &[&str]) -> MemoryCorpus {
    let corpus = MemoryCorpus::new();
    for (i, content) in contents.iter().enumerate() {
        corpus.add_speech(speech(i as i64 + 1, content)).unwrap();
    }
    corpus
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SinkCall {
    Clear,
    Upsert(Highlight),
}

/// Highlights sink that records every call in order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Clear))
            .count()
    }

    pub fn upserts(&self) -> Vec<Highlight> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Upsert(h) => Some(h),
                SinkCall::Clear => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl HighlightsSink for RecordingSink {
    async fn list(&self) -> AppResult<Vec<Highlight>> {
        Ok(self.upserts())
    }

    async fn upsert(&self, highlight: Highlight) -> AppResult<()> {
        self.calls.lock().unwrap().push(SinkCall::Upsert(highlight));
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.calls.lock().unwrap().push(SinkCall::Clear);
        Ok(())
    }
}

/// Vector index that answers every query with the same hits.
pub(crate) struct FixedIndex {
    pub hits: Vec<SimilarityResult>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FixedIndex {
    pub fn new(ids: &[ChunkId]) -> Self {
        let hits = ids
            .iter()
            .enumerate()
            .map(|(i, &chunk_id)| SimilarityResult {
                chunk_id,
                score: 1.0 - i as f64 * 0.1,
            })
            .collect();
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl VectorIndex for FixedIndex {
    async fn upsert(&self, _chunk_id: ChunkId, _embedding: Vec<f64>) -> AppResult<()> {
        Ok(())
    }

    async fn query_similar(&self, text: &str, k: usize) -> AppResult<Vec<SimilarityResult>> {
        self.queries.lock().unwrap().push((text.to_string(), k));
        Ok(self.hits.iter().take(k).copied().collect())
    }
}

/// Speeches source wrapper whose chunk fetch fails for batches containing
/// `poisoned`.
pub(crate) struct FlakySource {
    pub inner: MemoryCorpus,
    pub poisoned: ChunkId,
    pub fetches: Mutex<usize>,
}

#[async_trait::async_trait]
impl SpeechesSource for FlakySource {
    async fn list(&self, page: usize, size: usize) -> AppResult<Page<Speech>> {
        SpeechesSource::list(&self.inner, page, size).await
    }

    async fn get_chunks_by_ids(&self, ids: &[ChunkId]) -> AppResult<Vec<SpeechChunk>> {
        *self.fetches.lock().unwrap() += 1;
        if ids.contains(&self.poisoned) {
            return Err(AppError::Store("connection reset".to_string()));
        }
        self.inner.get_chunks_by_ids(ids).await
    }

    async fn get_all_chunks(&self) -> AppResult<Vec<SpeechChunk>> {
        self.inner.get_all_chunks().await
    }
}

/// Embedding provider that fails on any text containing `失敗`.
#[derive(Debug)]
pub(crate) struct FailingProvider {
    pub inner: MockProvider,
}

impl FailingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: MockProvider::new(dimensions),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "failing-v1"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f64>>> {
        if texts.iter().any(|t| t.contains("失敗")) {
            return Err(AppError::Embedding("429 Too Many Requests".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Generation provider that replays fixed fragments and records requests.
pub(crate) struct ScriptedLlm {
    pub fragments: Vec<AppResult<LlmStreamChunk>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn replying(fragments: &[&str]) -> Self {
        let mut items: Vec<AppResult<LlmStreamChunk>> = fragments
            .iter()
            .map(|f| Ok(LlmStreamChunk::text(*f)))
            .collect();
        items.push(Ok(LlmStreamChunk::finished(None)));
        Self {
            fragments: items,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_after(fragment: &str) -> Self {
        Self {
            fragments: vec![
                Ok(LlmStreamChunk::text(fragment)),
                Err(AppError::Llm("stream interrupted".to_string())),
            ],
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn replay(&self) -> Vec<AppResult<LlmStreamChunk>> {
        self.fragments
            .iter()
            .map(|item| match item {
                Ok(chunk) => Ok(chunk.clone()),
                Err(e) => Err(AppError::Llm(e.to_string())),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut content = String::new();
        for item in self.replay() {
            content.push_str(&item?.content);
        }
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Box::pin(futures::stream::iter(self.replay())))
    }
}
