//! Error types for Civic Lens.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, the generation and embedding
//! providers, the storage ports, prompt rendering and vector input errors.

use thiserror::Error;

/// Unified error type for Civic Lens.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Empty or degenerate input is never an error; it has a defined empty result.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Clustering, retrieval and answer pipeline errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Speeches source, highlights sink and vector store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Two vectors that must be compared have different lengths
    #[error("Vector dimensions mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error originated in an external provider call.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::Embedding(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
