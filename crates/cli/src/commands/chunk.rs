//! Chunk command handler.
//!
//! Runs the sentence chunker on ad-hoc text; useful for checking how a
//! transcript will be split before ingesting it.

use anyhow::Context;
use civic_knowledge::chunk;
use clap::Args;
use std::io::Read;
use std::path::PathBuf;

/// Split text into sentence chunks
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// Text to split (reads stdin when omitted)
    pub text: Option<String>,

    /// Read text from file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let text = self.input()?;
        let chunks = chunk(&text);
        tracing::debug!("Split {} chars into {} chunks", text.chars().count(), chunks.len());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        } else {
            for (i, chunk) in chunks.iter().enumerate() {
                println!("{:>4}  {}", i, chunk);
            }
        }

        Ok(())
    }

    fn input(&self) -> anyhow::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }

        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    }
}
