//! Speeches command handler.

use super::load_snapshot;
use civic_core::config::AppConfig;
use civic_knowledge::{MemoryCorpus, SpeechesSource};
use clap::Args;

/// List ingested speeches
#[derive(Args, Debug)]
pub struct SpeechesCommand {
    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Speeches per page
    #[arg(long, default_value = "20")]
    pub size: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SpeechesCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let snapshot = load_snapshot(config)?;
        let corpus = MemoryCorpus::from_parts(snapshot.speeches, snapshot.chunks, Vec::new());

        let page = SpeechesSource::list(&corpus, self.page, self.size).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&page)?);
            return Ok(());
        }

        for speech in &page.items {
            println!(
                "{:>6}  {}  {}  {}",
                speech.id, speech.date, speech.speaker, speech.session
            );
        }
        println!(
            "page {} ({} per page), {} speeches in total",
            self.page, self.size, page.total
        );
        Ok(())
    }
}
