//! Retrieval-augmented answering with enforced citations.

pub mod answer;
pub mod citation;
pub mod retriever;

pub use answer::{user_facing_error, Answer, AnswerPipeline, AnswerState};
pub use citation::{candidate_urls, cited_urls, enforce_citation};
pub use retriever::retrieve;
