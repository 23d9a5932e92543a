//! Caller-side citation enforcement.

use crate::types::RetrievedChunk;
use civic_prompt::NO_INFORMATION;

/// Distinct source URLs of the retrieved chunks, first occurrence first.
pub fn candidate_urls(chunks: &[RetrievedChunk]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for chunk in chunks {
        let url = chunk.source_url();
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Candidate URLs that appear verbatim in `answer`.
pub fn cited_urls(answer: &str, candidates: &[String]) -> Vec<String> {
    candidates
        .iter()
        .filter(|url| answer.contains(url.as_str()))
        .cloned()
        .collect()
}

/// Keep `answer` only if it quotes at least one candidate URL verbatim;
/// otherwise return the "no information" sentinel.
pub fn enforce_citation(answer: &str, candidates: &[String]) -> String {
    if candidates.iter().any(|url| answer.contains(url.as_str())) {
        answer.to_string()
    } else {
        NO_INFORMATION.to_string()
    }
}
