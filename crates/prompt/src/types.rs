//! Prompt types for Civic Lens.

use serde::{Deserialize, Serialize};

/// One retrieved passage the answer may cite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitedPassage {
    /// Passage text, rendered verbatim
    pub text: String,

    /// Citation target for this passage
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
}

impl CitedPassage {
    pub fn new(text: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.into(),
        }
    }
}

/// Input to [`crate::build_prompt`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptInput {
    /// The user's question
    pub question: String,

    /// Retrieved passages in ranking order
    #[serde(default)]
    pub passages: Vec<CitedPassage>,
}

impl PromptInput {
    pub fn new(question: impl Into<String>, passages: Vec<CitedPassage>) -> Self {
        Self {
            question: question.into(),
            passages,
        }
    }
}

/// A built prompt ready for the generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (answering policy)
    pub system: String,

    /// User message (question plus passages)
    pub user: String,

    /// Metadata about prompt construction
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about how a prompt was built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Number of passages rendered into the user message
    #[serde(rename = "passageCount")]
    pub passage_count: usize,

    /// Distinct non-empty source URLs, first-seen order
    #[serde(rename = "citationUrls")]
    pub citation_urls: Vec<String>,
}

impl BuiltPrompt {
    pub fn new(system: String, user: String, metadata: BuiltPromptMetadata) -> Self {
        Self {
            system,
            user,
            metadata,
        }
    }

    /// True when no passage was available, so the only valid answer is the sentinel.
    pub fn is_empty(&self) -> bool {
        self.metadata.passage_count == 0
    }
}
