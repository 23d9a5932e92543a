//! Prompt system for Civic Lens.
//!
//! This crate turns a question plus retrieved passages into the system/user
//! prompt pair sent to the generation provider:
//! - Fixed answering policy (Japanese, cited, no speculation)
//! - Handlebars rendering of the user prompt
//! - Candidate-URL addendum for strict citation
//! - Fixed user-facing Japanese messages

pub mod builder;
pub mod messages;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, with_citation_requirements, SYSTEM_PROMPT};
pub use messages::{get_message, CHAT_ERROR, NO_INFORMATION};
pub use types::{BuiltPrompt, BuiltPromptMetadata, CitedPassage, PromptInput};
