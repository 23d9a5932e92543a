//! Command handlers for the Civic Lens CLI.
//!
//! Every batch command reads the corpus snapshot, runs one pipeline and
//! writes the snapshot back.

pub mod ask;
pub mod chunk;
pub mod embed;
pub mod highlights;
pub mod ingest;
pub mod speeches;

pub use ask::AskCommand;
pub use chunk::ChunkCommand;
pub use embed::EmbedCommand;
pub use highlights::HighlightsCommand;
pub use ingest::IngestCommand;
pub use speeches::SpeechesCommand;

use anyhow::Context;
use civic_core::config::AppConfig;
use civic_knowledge::{
    create_provider, CorpusSnapshot, EmbeddingConfig, EmbeddingProvider, InMemoryVectorIndex,
    MemoryCorpus,
};
use std::sync::Arc;

/// Resolve and build the configured embedding provider.
pub(crate) fn embedding_provider(
    config: &AppConfig,
) -> anyhow::Result<(EmbeddingConfig, Arc<dyn EmbeddingProvider>)> {
    let embedding_config = EmbeddingConfig::from_app_config(config)?;
    let api_key = config.resolve_api_key(&embedding_config.provider);
    let provider = create_provider(&embedding_config, api_key.as_deref())?;
    Ok((embedding_config, provider))
}

pub(crate) fn load_snapshot(config: &AppConfig) -> anyhow::Result<CorpusSnapshot> {
    let path = config.corpus_path();
    CorpusSnapshot::load_or_default(&path)
        .with_context(|| format!("failed to load corpus snapshot {}", path.display()))
}

pub(crate) fn save_snapshot(config: &AppConfig, snapshot: &CorpusSnapshot) -> anyhow::Result<()> {
    let path = config.corpus_path();
    snapshot
        .save(&path)
        .with_context(|| format!("failed to save corpus snapshot {}", path.display()))
}

/// Corpus plus vector index restored from the snapshot, with the stored
/// embedding dimension checked against the provider.
pub(crate) fn open_index(
    config: &AppConfig,
) -> anyhow::Result<(MemoryCorpus, InMemoryVectorIndex, Arc<dyn EmbeddingProvider>)> {
    let (embedding_config, provider) = embedding_provider(config)?;
    let (corpus, index) = load_snapshot(config)?.restore(provider.clone())?;

    embedding_config
        .check_stored_dimensions(index.dimensions()?)
        .context("stored embeddings do not match the configured provider; re-run `civic embed --all`")?;

    Ok((corpus, index, provider))
}
