//! Corpus type definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a stored speech chunk.
pub type ChunkId = i64;

/// Identity of a stored speech.
pub type SpeechId = i64;

/// One council speech, as extracted from the minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speech {
    pub id: SpeechId,

    /// Session date (`YYYY-MM-DD`)
    pub date: NaiveDate,

    /// Session name, e.g. "令和6年第1回定例会"
    pub session: String,

    pub speaker: String,

    /// Full transcript text
    pub content: String,

    /// Page the transcript was taken from
    pub source_url: String,
}

/// A sentence-level segment of a speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechChunk {
    pub id: ChunkId,

    /// Owning speech
    pub speech_id: SpeechId,

    /// 0-based position within the speech
    pub idx: usize,

    /// Non-empty segment text
    pub text: String,

    /// Citation target
    pub source_url: String,
}

/// Embedding vector stored for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    pub chunk_id: ChunkId,
    pub embedding: Vec<f64>,
}

impl EmbeddingRecord {
    pub fn new(chunk_id: ChunkId, embedding: Vec<f64>) -> Self {
        Self {
            chunk_id,
            embedding,
        }
    }
}

/// Summary of one topic cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Unique within the highlight set
    pub cluster_label: String,

    /// Number of chunks assigned to the cluster
    pub count: usize,

    /// Representative member
    pub sample_chunk_id: ChunkId,
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub chunk_id: ChunkId,

    /// Cosine similarity in [-1, 1]
    pub score: f64,
}

/// A chunk returned by the retriever, with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: SpeechChunk,
    pub score: f64,
}

impl RetrievedChunk {
    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn source_url(&self) -> &str {
        &self.chunk.source_url
    }
}

/// One page of a listing plus the overall total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_json_shape() {
        let json = r#"{
            "id": 1,
            "date": "2024-03-05",
            "session": "令和6年第1回定例会",
            "speaker": "池元勝",
            "content": "子育て支援を拡充します。",
            "sourceUrl": "https://example.com/minutes/1"
        }"#;

        let speech: Speech = serde_json::from_str(json).unwrap();
        assert_eq!(speech.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(speech.source_url, "https://example.com/minutes/1");
    }

    #[test]
    fn test_highlight_serializes_camel_case() {
        let highlight = Highlight {
            cluster_label: "子育・支援".to_string(),
            count: 3,
            sample_chunk_id: 7,
        };

        let value = serde_json::to_value(&highlight).unwrap();
        assert_eq!(value["clusterLabel"], "子育・支援");
        assert_eq!(value["sampleChunkId"], 7);
    }
}
