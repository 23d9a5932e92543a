//! Speech knowledge base for Civic Lens.
//!
//! Sentence-level chunks of council speeches are embedded, clustered into
//! topic highlights, and retrieved to answer questions with mandatory source
//! citations. Every pipeline is written against the ports in [`ports`]; the
//! in-memory bindings live in [`store`] and [`vector_index`].

pub mod chunker;
pub mod cluster;
pub mod embed_job;
pub mod embeddings;
pub mod highlights;
pub mod ports;
pub mod progress;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{chunk, chunk_speech};
pub use cluster::{generate_cluster_label, kmeans, KMeansResult, UNCATEGORIZED};
pub use embed_job::{EmbedOptions, EmbedStats, EmbeddingJob};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use highlights::{update_highlights, HighlightOptions};
pub use ports::{EmbeddingsSource, HighlightsSink, SpeechesSource};
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{retrieve, user_facing_error, Answer, AnswerPipeline, AnswerState};
pub use store::{CorpusSnapshot, MemoryCorpus};
pub use types::{
    ChunkId, EmbeddingRecord, Highlight, Page, RetrievedChunk, SimilarityResult, Speech,
    SpeechChunk, SpeechId,
};
pub use vector_index::{cosine_similarity, InMemoryVectorIndex, VectorIndex};
