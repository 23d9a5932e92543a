//! Embed command handler.
//!
//! Runs the batch embedding job over the corpus snapshot.

use super::{embedding_provider, load_snapshot, save_snapshot};
use civic_core::config::AppConfig;
use civic_knowledge::{
    CorpusSnapshot, EmbedOptions, EmbeddingJob, InMemoryVectorIndex, MemoryCorpus, ProgressEvent,
    ProgressReporter,
};
use clap::Args;
use std::collections::HashSet;
use std::sync::Arc;

/// Embed chunks into the vector index
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Re-embed every chunk, discarding stored vectors
    #[arg(long)]
    pub all: bool,

    /// Chunk ids fetched per batch (overrides config)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause after each chunk in milliseconds (overrides config)
    #[arg(long)]
    pub rate_limit_ms: Option<u64>,

    /// Do not print progress lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EmbedCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing embed command");
        config.ensure_civic_dir()?;

        let (embedding_config, provider) = embedding_provider(config)?;
        let mut snapshot = load_snapshot(config)?;
        if self.all {
            snapshot.embeddings.clear();
        }

        let (corpus, index) = snapshot.restore(provider.clone())?;
        embedding_config.check_stored_dimensions(index.dimensions()?)?;

        let embedded: HashSet<i64> = index.records()?.iter().map(|r| r.chunk_id).collect();
        let pending: Vec<i64> = corpus
            .chunk_ids()?
            .into_iter()
            .filter(|id| !embedded.contains(id))
            .collect();

        let mut options = EmbedOptions::from(config.embedding);
        if let Some(batch_size) = self.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(rate_limit_ms) = self.rate_limit_ms {
            options.rate_limit_ms = rate_limit_ms;
        }

        let progress = if self.quiet || self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("{}", event.format_simple())))
        };

        let job = EmbeddingJob::new(&corpus, &index, provider.as_ref(), options);
        let stats = job.run(&pending, &progress).await;

        save(config, &corpus, &index)?;

        if self.json {
            let output = serde_json::json!({
                "provider": provider.provider_name(),
                "model": provider.model_name(),
                "total": stats.total,
                "processed": stats.processed,
                "failed": stats.failed,
                "missing": stats.missing,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Embedded {} of {} chunks with {}/{} ({} failed, {} missing)",
                stats.processed,
                stats.total,
                provider.provider_name(),
                provider.model_name(),
                stats.failed,
                stats.missing
            );
        }

        Ok(())
    }
}

fn save(
    config: &AppConfig,
    corpus: &MemoryCorpus,
    index: &InMemoryVectorIndex,
) -> anyhow::Result<()> {
    let snapshot = CorpusSnapshot::capture(corpus, index)?;
    save_snapshot(config, &snapshot)
}
