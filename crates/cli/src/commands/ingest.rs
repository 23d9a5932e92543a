//! Ingest command handler.
//!
//! Loads speeches already extracted to JSON, splits them into sentence chunks
//! and adds them to the corpus snapshot.

use super::{load_snapshot, save_snapshot};
use anyhow::Context;
use civic_core::config::AppConfig;
use civic_knowledge::{MemoryCorpus, Speech};
use clap::Args;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Add speeches from JSON files to the corpus
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// JSON files or directories (searched recursively for *.json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command");
        config.ensure_civic_dir()?;

        let mut snapshot = load_snapshot(config)?;
        let corpus = MemoryCorpus::from_parts(
            std::mem::take(&mut snapshot.speeches),
            std::mem::take(&mut snapshot.chunks),
            std::mem::take(&mut snapshot.highlights),
        );

        let mut files = 0usize;
        let mut added = 0usize;
        let mut skipped = 0usize;
        let mut chunks = 0usize;

        for file in self.json_files() {
            files += 1;
            for speech in read_speeches(&file)? {
                let id = speech.id;
                match corpus.add_speech(speech) {
                    Ok(new_chunks) => {
                        added += 1;
                        chunks += new_chunks.len();
                    }
                    Err(e) => {
                        tracing::warn!("Skipping speech {} from {:?}: {}", id, file, e);
                        skipped += 1;
                    }
                }
            }
        }

        snapshot.speeches = corpus.speeches()?;
        snapshot.chunks = corpus.chunks()?;
        snapshot.highlights = corpus.highlights()?;
        save_snapshot(config, &snapshot)?;

        tracing::info!(
            "Ingested {} speeches ({} chunks) from {} files, {} skipped",
            added,
            chunks,
            files,
            skipped
        );

        if self.json {
            let output = serde_json::json!({
                "files": files,
                "speeches": added,
                "chunks": chunks,
                "skipped": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} speeches ({} chunks) from {} files; {} skipped",
                added, chunks, files, skipped
            );
        }

        Ok(())
    }

    /// Every `.json` file under the given paths, sorted per directory.
    fn json_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for path in &self.paths {
            if path.is_file() {
                files.push(path.clone());
                continue;
            }

            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && is_json(entry_path) {
                    files.push(entry_path.to_path_buf());
                }
            }
        }
        files
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// A file holds either one speech object or an array of them.
fn read_speeches(path: &Path) -> anyhow::Result<Vec<Speech>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    let speeches: Result<Vec<Speech>, _> = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value::<Speech>(value).map(|speech| vec![speech])
    };

    speeches.with_context(|| format!("{} does not contain speech records", path.display()))
}
