//! Ask command handler.
//!
//! Answers a question from the ingested speeches with a mandatory source
//! citation, or the fixed "no information" reply.

use super::open_index;
use civic_core::config::AppConfig;
use civic_knowledge::{user_facing_error, Answer, AnswerPipeline};
use civic_llm::create_client;
use clap::Args;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ask a question about the ingested speeches
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (overrides config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Show the retrieved chunks
    #[arg(long)]
    pub show_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        match self.answer(config).await {
            Ok(answer) => self.print(&answer),
            Err(e) => {
                tracing::error!("Ask failed: {:#}", e);
                let message = match e.downcast_ref::<civic_core::AppError>() {
                    Some(app_error) => user_facing_error(app_error),
                    None => civic_prompt::CHAT_ERROR,
                };
                println!("{}", message);
                Err(e)
            }
        }
    }

    async fn answer(&self, config: &AppConfig) -> anyhow::Result<Answer> {
        config.validate()?;

        let (corpus, index, embedder) = open_index(config)?;

        let provider_config = config.get_provider_config(&config.provider);
        let endpoint = provider_config.as_ref().and_then(|pc| pc.endpoint());
        let timeout = provider_config
            .as_ref()
            .and_then(|pc| pc.timeout_secs())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let api_key = config.resolve_api_key(&config.provider);

        let generator = create_client(
            &config.provider,
            endpoint,
            api_key.as_deref(),
            Duration::from_secs(timeout),
        )?;

        tracing::debug!(
            "Answering with {}/{} over {} indexed chunks",
            config.provider,
            config.model,
            index.len()?
        );

        let pipeline = AnswerPipeline::new(
            &index,
            &corpus,
            embedder.as_ref(),
            generator.as_ref(),
            config.model.clone(),
        )
        .with_top_k(self.top_k.unwrap_or(config.retrieval.top_k))
        .with_generation(config.generation);

        Ok(pipeline.answer(&self.question).await?)
    }

    fn print(&self, answer: &Answer) -> anyhow::Result<()> {
        if self.json {
            let sources: Vec<serde_json::Value> = answer
                .chunks
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "chunkId": c.chunk.id,
                        "score": c.score,
                        "sourceUrl": c.source_url(),
                        "text": c.text(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "answer": answer.text,
                "state": answer.state,
                "citations": answer.citations,
                "sources": sources,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", answer.text);

        if self.show_sources && !answer.chunks.is_empty() {
            println!();
            for (i, chunk) in answer.chunks.iter().enumerate() {
                println!("[{}] {:.3}  {}", i + 1, chunk.score, chunk.text());
                println!("    {}", chunk.source_url());
            }
        }
        Ok(())
    }
}
