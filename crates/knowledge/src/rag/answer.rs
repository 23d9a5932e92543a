//! End-to-end cited answering: retrieve, prompt, generate, enforce.

use crate::embeddings::EmbeddingProvider;
use crate::ports::SpeechesSource;
use crate::rag::citation::{candidate_urls, cited_urls, enforce_citation};
use crate::rag::retriever::retrieve;
use crate::types::RetrievedChunk;
use crate::vector_index::VectorIndex;
use civic_core::config::GenerationSettings;
use civic_core::{AppError, AppResult};
use civic_llm::{collect_stream, LlmClient, LlmRequest};
use civic_prompt::{
    build_prompt, with_citation_requirements, CitedPassage, PromptInput, CHAT_ERROR,
    NO_INFORMATION,
};
use serde::Serialize;

/// Stages of one answer request.
///
/// `Received -> Retrieving -> NoChunks -> RespondingSentinel`, or
/// `Received -> Retrieving -> ChunksFound -> Generating -> Validating` and then
/// `RespondingFinal` or `RespondingSentinel`. Any upstream fault ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerState {
    Received,
    Retrieving,
    NoChunks,
    ChunksFound,
    Generating,
    Validating,
    RespondingSentinel,
    RespondingFinal,
    Failed,
}

impl AnswerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AnswerState::RespondingSentinel | AnswerState::RespondingFinal | AnswerState::Failed
        )
    }
}

/// Result of a completed request.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Reply shown to the user: the generated text or the sentinel
    pub text: String,

    /// Terminal state reached
    pub state: AnswerState,

    /// Candidate URLs quoted by the reply; empty for the sentinel
    pub citations: Vec<String>,

    /// Chunks the reply was grounded on
    #[serde(skip)]
    pub chunks: Vec<RetrievedChunk>,
}

impl Answer {
    fn sentinel(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            text: NO_INFORMATION.to_string(),
            state: AnswerState::RespondingSentinel,
            citations: Vec::new(),
            chunks,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.state == AnswerState::RespondingSentinel
    }
}

/// Message shown to end users for any failed request. Details go to the log.
pub fn user_facing_error(_error: &AppError) -> &'static str {
    CHAT_ERROR
}

/// Wires the retriever, prompt builder, generation provider and citation check.
pub struct AnswerPipeline<'a> {
    index: &'a dyn VectorIndex,
    source: &'a dyn SpeechesSource,
    embedder: &'a dyn EmbeddingProvider,
    generator: &'a dyn LlmClient,
    model: String,
    top_k: usize,
    generation: GenerationSettings,
}

impl<'a> AnswerPipeline<'a> {
    pub fn new(
        index: &'a dyn VectorIndex,
        source: &'a dyn SpeechesSource,
        embedder: &'a dyn EmbeddingProvider,
        generator: &'a dyn LlmClient,
        model: impl Into<String>,
    ) -> Self {
        Self {
            index,
            source,
            embedder,
            generator,
            model: model.into(),
            top_k: 5,
            generation: GenerationSettings::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    fn request(&self, prompt: String, system: String) -> LlmRequest {
        let mut request = LlmRequest::new(prompt, self.model.clone())
            .with_system(system)
            .with_streaming();
        if let Some(temperature) = self.generation.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.generation.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// Answer `question`.
    ///
    /// With no retrieved chunks the sentinel is returned and the generator is
    /// never called. Otherwise the full reply is buffered and kept only if it
    /// quotes one of the retrieved source URLs.
    ///
    /// # Errors
    /// Retrieval, prompt and generation failures are returned as-is after the
    /// request is logged as failed.
    pub async fn answer(&self, question: &str) -> AppResult<Answer> {
        let mut state = AnswerState::Received;

        match self.run(question, &mut state).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::error!("Answer failed in state {:?}: {}", state, e);
                advance(&mut state, AnswerState::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, question: &str, state: &mut AnswerState) -> AppResult<Answer> {
        advance(state, AnswerState::Retrieving);
        let chunks = retrieve(question, self.top_k, self.index, self.source, self.embedder).await?;

        if chunks.is_empty() {
            advance(state, AnswerState::NoChunks);
            advance(state, AnswerState::RespondingSentinel);
            return Ok(Answer::sentinel(chunks));
        }
        advance(state, AnswerState::ChunksFound);

        let passages: Vec<CitedPassage> = chunks
            .iter()
            .map(|c| CitedPassage::new(c.text(), c.source_url()))
            .collect();
        let prompt = build_prompt(&PromptInput::new(question, passages))?;
        let candidates = candidate_urls(&chunks);
        let system = with_citation_requirements(&prompt.system, &candidates)?;

        advance(state, AnswerState::Generating);
        let request = self.request(prompt.user, system);
        let stream = self.generator.stream(&request).await?;
        let reply = collect_stream(stream).await?;

        advance(state, AnswerState::Validating);
        let text = enforce_citation(&reply, &candidates);
        if text == NO_INFORMATION {
            tracing::info!(
                "Reply quoted none of {} candidate URLs, answering with sentinel",
                candidates.len()
            );
            advance(state, AnswerState::RespondingSentinel);
            return Ok(Answer::sentinel(chunks));
        }

        advance(state, AnswerState::RespondingFinal);
        Ok(Answer {
            citations: cited_urls(&text, &candidates),
            text,
            state: *state,
            chunks,
        })
    }
}

fn advance(state: &mut AnswerState, next: AnswerState) {
    tracing::debug!("Answer state {:?} -> {:?}", state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(AnswerState::RespondingFinal.is_terminal());
        assert!(AnswerState::RespondingSentinel.is_terminal());
        assert!(AnswerState::Failed.is_terminal());
        assert!(!AnswerState::Generating.is_terminal());
        assert!(!AnswerState::NoChunks.is_terminal());
    }

    #[test]
    fn test_state_serializes_like_wire_names() {
        let json = serde_json::to_string(&AnswerState::RespondingSentinel).unwrap();
        assert_eq!(json, "\"RESPONDING_SENTINEL\"");
    }

    #[test]
    fn test_user_facing_error_hides_cause() {
        let err = AppError::Llm("401 Unauthorized: invalid key sk-...".to_string());
        assert_eq!(user_facing_error(&err), CHAT_ERROR);
    }
}
