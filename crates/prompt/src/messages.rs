//! Fixed user-facing Japanese messages.

/// Sentinel answer when nothing citable was found.
pub const NO_INFORMATION: &str = "情報がありません。";

/// Generic failure shown to end users when the answer pipeline fails.
pub const CHAT_ERROR: &str = "チャットでエラーが発生しました";

/// Fallback for unknown message keys.
pub const UNKNOWN_ERROR: &str = "エラーが発生しました";

/// Look up a message by dotted key, e.g. `errors.noInformation`.
pub fn get_message(key: &str) -> &'static str {
    match key {
        "errors.dataFetchFailed" => "データの取得に失敗しました",
        "errors.noInformation" => NO_INFORMATION,
        "errors.chatError" => CHAT_ERROR,
        "errors.instagramFetchFailed" => "Instagram投稿の取得に失敗しました",
        "errors.speechesFetchFailed" => "発言データの取得に失敗しました",
        "errors.highlightsFetchFailed" => "ハイライトデータの取得に失敗しました",
        "loading.fetchingData" => "データを取得中...",
        "loading.processing" => "処理中...",
        "loading.generatingResponse" => "回答を生成中...",
        "actions.retry" => "再試行",
        "actions.refresh" => "更新",
        "actions.contact" => "お問い合わせ",
        "emptyState.noData" => "データがありません",
        "emptyState.noResults" => "検索結果がありません",
        "emptyState.suggestion" => "データを更新するか、お問い合わせください",
        _ => UNKNOWN_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(get_message("errors.noInformation"), "情報がありません。");
        assert_eq!(get_message("errors.chatError"), CHAT_ERROR);
        assert_eq!(get_message("loading.generatingResponse"), "回答を生成中...");
    }

    #[test]
    fn test_unknown_key_falls_back() {
        assert_eq!(get_message("errors.missing"), "エラーが発生しました");
        assert_eq!(get_message(""), UNKNOWN_ERROR);
    }
}
