//! Sentence chunking for Japanese speech transcripts.

use crate::types::{ChunkId, Speech, SpeechChunk};

/// Split text into sentence-level segments.
///
/// `。`, `！` and `？` always end a segment; a run of the same mark counts once
/// and the repeats are dropped. `…` ends a segment only at end of input or
/// before whitespace. Segments are trimmed and empty ones discarded.
pub fn chunk(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let ends_segment = match c {
            '。' | '！' | '？' => {
                while chars.peek() == Some(&c) {
                    chars.next();
                }
                true
            }
            '…' => chars.peek().map_or(true, |next| next.is_whitespace()),
            _ => false,
        };

        if ends_segment {
            push_trimmed(&mut chunks, &current);
            current.clear();
        }
    }

    push_trimmed(&mut chunks, &current);
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Chunk a speech into stored chunks with consecutive ids from `first_id`.
pub fn chunk_speech(speech: &Speech, first_id: ChunkId) -> Vec<SpeechChunk> {
    chunk(&speech.content)
        .into_iter()
        .enumerate()
        .map(|(idx, text)| SpeechChunk {
            id: first_id + idx as ChunkId,
            speech_id: speech.id,
            idx,
            text,
            source_url: speech.source_url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_input() {
        assert!(chunk("").is_empty());
        assert!(chunk("   \n\t").is_empty());
    }

    #[test]
    fn test_basic_sentences() {
        assert_eq!(chunk("A。B。"), vec!["A。", "B。"]);
        assert_eq!(
            chunk("今日は晴れです。明日は雨でしょう。"),
            vec!["今日は晴れです。", "明日は雨でしょう。"]
        );
    }

    #[test]
    fn test_repeated_marks_collapse() {
        assert_eq!(chunk("A。。。B。"), vec!["A。", "B。"]);
        assert_eq!(chunk("本当に！！やります？？"), vec!["本当に！", "やります？"]);
    }

    #[test]
    fn test_mixed_marks_split_separately() {
        assert_eq!(chunk("えっ！？本当。"), vec!["えっ！", "？", "本当。"]);
    }

    #[test]
    fn test_trailing_text_kept() {
        assert_eq!(chunk("一文目。二文目"), vec!["一文目。", "二文目"]);
        assert_eq!(chunk("  句点なし  "), vec!["句点なし"]);
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(
            chunk("これについては…検討が必要だと思います。"),
            vec!["これについては…検討が必要だと思います。"]
        );
        assert_eq!(chunk("そうですね… 次に。"), vec!["そうですね…", "次に。"]);
        assert_eq!(chunk("考え中…"), vec!["考え中…"]);
    }

    #[test]
    fn test_segments_are_trimmed() {
        assert_eq!(chunk(" 最初。\n 次。 "), vec!["最初。", "次。"]);
    }

    #[test]
    fn test_chunk_speech_stamps_metadata() {
        let speech = Speech {
            id: 9,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            session: "定例会".to_string(),
            speaker: "池元勝".to_string(),
            content: "道路を整備します。公園も増やします。".to_string(),
            source_url: "https://example.com/9".to_string(),
        };

        let chunks = chunk_speech(&speech, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, 100);
        assert_eq!(chunks[1].id, 101);
        assert_eq!(chunks[1].idx, 1);
        assert_eq!(chunks[1].speech_id, 9);
        assert_eq!(chunks[1].text, "公園も増やします。");
        assert!(chunks.iter().all(|c| c.source_url == "https://example.com/9"));
    }
}
