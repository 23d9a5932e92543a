//! Frequency-based labels for clusters of Japanese text.
//!
//! Candidate terms are every 2-4 character window made only of kanji, hiragana
//! or katakana. There is no morphological analysis; windows that are pure
//! grammar (particles, copulas, demonstratives) are dropped by a fixed list.

use std::collections::HashMap;

/// Label for empty clusters and clusters with no usable terms.
pub const UNCATEGORIZED: &str = "未分類";

/// Separator between the two leading terms.
pub const TERM_SEPARATOR: &str = "・";

/// Suffix appended when more than two terms were found.
pub const RELATED_SUFFIX: &str = "関連";

const MIN_TERM_CHARS: usize = 2;
const MAX_TERM_CHARS: usize = 4;
const TOP_TERMS: usize = 3;

/// Removed before windowing; the text on either side is joined.
const PUNCTUATION: &[char] = &[
    '、', '。', '，', '．', ',', '.', '！', '？', '!', '?', '「', '」', '『', '』', '（', '）',
    '(', ')', '【', '】', '［', '］', '[', ']', '・', '…', '‥', '：', ':', '；', ';', '〜', '～',
    '"', '\'', '“', '”',
];

const STOPWORDS: &[&str] = &[
    // demonstratives
    "これ", "それ", "あれ", "どれ", "この", "その", "あの", "どの", "ここ", "そこ", "あそこ",
    "こちら", "そちら", "どちら",
    // copulas and auxiliaries
    "です", "でした", "でしょう", "ます", "ました", "ません", "ませ", "まし", "だった", "である",
    "であり", "する", "して", "した", "します", "される", "されて", "いる", "いた", "います",
    "いま", "ある", "あり", "あります", "なる", "なり", "なります", "おり", "おります", "てい",
    "てお", "った", "って",
    // particles and connectives
    "こと", "もの", "ため", "よう", "など", "から", "まで", "より", "について", "につ", "つい",
    "ついて", "いて", "として", "という", "といった", "における", "によって", "により", "また",
    "および", "及び", "ので", "のは", "のが", "のを", "には", "では", "とは", "にも", "でも",
    "ても", "けど", "けれど", "けれども",
    // speech fillers
    "思い", "思いま", "思います",
];

fn is_term_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '々'
        | '\u{3041}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FA}'
        | '\u{30FC}'..='\u{30FF}')
}

/// Ranked term frequencies: count descending, then first occurrence.
pub fn term_frequencies<S: AsRef<str>>(texts: &[S]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let chars: Vec<char> = text
            .as_ref()
            .chars()
            .filter(|c| !PUNCTUATION.contains(c))
            .collect();

        for start in 0..chars.len() {
            for len in MIN_TERM_CHARS..=MAX_TERM_CHARS {
                let Some(window) = chars.get(start..start + len) else {
                    break;
                };
                if !window.iter().all(|&c| is_term_char(c)) {
                    break;
                }

                let term: String = window.iter().collect();
                if STOPWORDS.contains(&term.as_str()) {
                    continue;
                }

                match positions.get(&term) {
                    Some(&pos) => counts[pos].1 += 1,
                    None => {
                        positions.insert(term.clone(), counts.len());
                        counts.push((term, 1));
                    }
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Derive a short label from the member texts of one cluster.
///
/// One term gives the term itself, two give `A・B`, three give `A・B関連`.
pub fn generate_cluster_label<S: AsRef<str>>(texts: &[S]) -> String {
    let terms: Vec<String> = term_frequencies(texts)
        .into_iter()
        .take(TOP_TERMS)
        .map(|(term, _)| term)
        .collect();

    match terms.as_slice() {
        [] => UNCATEGORIZED.to_string(),
        [only] => only.clone(),
        [first, second] => format!("{}{}{}", first, TERM_SEPARATOR, second),
        [first, second, ..] => format!("{}{}{}{}", first, TERM_SEPARATOR, second, RELATED_SUFFIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_uncategorized() {
        let texts: Vec<String> = Vec::new();
        assert_eq!(generate_cluster_label(&texts), UNCATEGORIZED);
    }

    #[test]
    fn test_no_terms_is_uncategorized() {
        assert_eq!(generate_cluster_label(&["abc 123", "。、！"]), UNCATEGORIZED);
        assert_eq!(generate_cluster_label(&["これ", "です"]), UNCATEGORIZED);
    }

    #[test]
    fn test_single_term() {
        assert_eq!(generate_cluster_label(&["予算", "予算"]), "予算");
    }

    #[test]
    fn test_two_terms() {
        // "予算" and "確保" only; the joined window "算確" never forms across the space
        assert_eq!(generate_cluster_label(&["予算 確保", "予算 確保"]), "予算・確保");
    }

    #[test]
    fn test_three_terms_get_suffix() {
        assert_eq!(generate_cluster_label(&["防災 訓練 避難"]), "防災・訓練関連");
    }

    #[test]
    fn test_repeated_token_appears_in_label() {
        let texts = [
            "子育て支援を拡充します。",
            "子育ての負担を減らしたい。",
            "子育て世帯への給付について。",
        ];
        let label = generate_cluster_label(&texts);
        assert!(label.contains("子育"), "label was {}", label);
    }

    #[test]
    fn test_frequency_then_first_seen() {
        let ranked = term_frequencies(&["道路 公園 公園"]);
        assert_eq!(ranked[0], ("公園".to_string(), 2));
        assert_eq!(ranked[1], ("道路".to_string(), 1));
    }

    #[test]
    fn test_punctuation_is_removed_not_split() {
        let ranked = term_frequencies(&["市、民"]);
        assert_eq!(ranked, vec![("市民".to_string(), 1)]);
    }

    #[test]
    fn test_windows_up_to_four_chars() {
        let ranked = term_frequencies(&["議会運営委"]);
        let terms: Vec<&str> = ranked.iter().map(|(t, _)| t.as_str()).collect();
        assert!(terms.contains(&"議会運営"));
        assert!(!terms.contains(&"議会運営委"));
        assert!(terms.contains(&"運営委"));
    }

    #[test]
    fn test_katakana_and_iteration_mark() {
        let ranked = term_frequencies(&["デジタル化 人々"]);
        let terms: Vec<&str> = ranked.iter().map(|(t, _)| t.as_str()).collect();
        assert!(terms.contains(&"デジタ"));
        assert!(terms.contains(&"人々"));
    }
}
