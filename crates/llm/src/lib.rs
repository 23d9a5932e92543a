//! Generation provider integration for Civic Lens.
//!
//! This crate provides a provider-agnostic abstraction over chat/completion
//! models. The answer pipeline talks to the [`LlmClient`] trait only; the
//! concrete binding is picked at startup by [`create_client`].
//!
//! # Providers
//! - **OpenAI**: chat completions with SSE streaming (default)
//! - **Ollama**: local runtime with NDJSON streaming
//!
//! # Example
//! ```no_run
//! use civic_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("こんにちは", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    collect_stream, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::{create_client, ProviderType};
pub use providers::{OllamaClient, OpenAiClient};
