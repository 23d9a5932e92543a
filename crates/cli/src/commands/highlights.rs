//! Highlights command handler.
//!
//! Re-clusters every embedded chunk and replaces the stored highlights.

use super::{load_snapshot, save_snapshot};
use civic_core::config::AppConfig;
use civic_knowledge::{update_highlights, Highlight, HighlightOptions, MemoryCorpus};
use clap::Args;

/// Regenerate topic highlights
#[derive(Args, Debug)]
pub struct HighlightsCommand {
    /// Number of clusters (overrides config)
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Seed for centroid initialization (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only print the stored highlights
    #[arg(long)]
    pub list: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HighlightsCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing highlights command");

        let mut snapshot = load_snapshot(config)?;

        if !self.list {
            let mut options = HighlightOptions::from(config.highlights);
            if let Some(k) = self.k {
                options = options.with_k(k);
            }
            if let Some(seed) = self.seed {
                options = options.with_seed(seed);
            }

            let corpus = MemoryCorpus::from_parts(
                snapshot.speeches.clone(),
                snapshot.chunks.clone(),
                Vec::new(),
            );
            update_highlights(&corpus, &corpus, &snapshot, options).await?;

            snapshot.highlights = corpus.highlights()?;
            config.ensure_civic_dir()?;
            save_snapshot(config, &snapshot)?;
        }

        self.print(&snapshot.highlights)
    }

    fn print(&self, highlights: &[Highlight]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(highlights)?);
            return Ok(());
        }

        if highlights.is_empty() {
            println!("No highlights");
            return Ok(());
        }

        for highlight in highlights {
            println!(
                "{:>5}  {}  (sample chunk {})",
                highlight.count, highlight.cluster_label, highlight.sample_chunk_id
            );
        }
        Ok(())
    }
}
