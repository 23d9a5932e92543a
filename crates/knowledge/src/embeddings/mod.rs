//! Embedding providers.
//!
//! Turns chunk and query text into fixed-length vectors through a
//! provider-agnostic trait.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
