//! Civic Lens CLI
//!
//! Main entry point for the `civic` command-line tool: batch jobs over the
//! speech corpus (ingest, embed, highlights) and cited question answering.

mod commands;

use clap::{Parser, Subcommand};
use civic_core::{config::AppConfig, logging};
use commands::{
    AskCommand, ChunkCommand, EmbedCommand, HighlightsCommand, IngestCommand, SpeechesCommand,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Civic Lens CLI - cited answers and topic highlights from council speeches
#[derive(Parser, Debug)]
#[command(name = "civic")]
#[command(about = "Cited answers and topic highlights from council speeches", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CIVIC_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (openai, ollama)
    #[arg(short, long, global = true, env = "CIVIC_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "CIVIC_MODEL")]
    model: Option<String>,

    /// Embedding provider (mock, openai, ollama)
    #[arg(long, global = true, env = "CIVIC_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add speeches from JSON files to the corpus
    Ingest(IngestCommand),

    /// Split text into sentence chunks
    Chunk(ChunkCommand),

    /// Embed chunks into the vector index
    Embed(EmbedCommand),

    /// Regenerate topic highlights
    Highlights(HighlightsCommand),

    /// List ingested speeches
    Speeches(SpeechesCommand),

    /// Ask a question about the ingested speeches
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.embedding_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    if let Err(e) = logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!("Embedding provider: {}", config.embedding_provider);

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Chunk(_) => "chunk",
        Commands::Embed(_) => "embed",
        Commands::Highlights(_) => "highlights",
        Commands::Speeches(_) => "speeches",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Chunk(cmd) => cmd.execute().await,
        Commands::Embed(cmd) => cmd.execute(&config).await,
        Commands::Highlights(cmd) => cmd.execute(&config).await,
        Commands::Speeches(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match result {
        Ok(()) => {
            tracing::debug!("Command completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Command failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
