//! Prompt builder for the cited-answer policy.

use crate::messages::NO_INFORMATION;
use crate::types::{BuiltPrompt, BuiltPromptMetadata, CitedPassage, PromptInput};
use civic_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Fixed answering policy sent as the system message.
pub const SYSTEM_PROMPT: &str = "あなたは池元勝市議の政治活動について詳しいアシスタントです。

以下のルールを厳格に守ってください：
1. 日本語でカジュアルな口調で回答してください
2. 提供された発言内容からのみ回答し、必ず引用元のsource_urlを含めてください
3. 提供された情報で回答できない場合は「情報がありません。」と回答してください
4. 推測や一般的な知識は使わず、発言内容に基づいた事実のみを回答してください
5. 回答には必ず出典URLを含めてください
6. 【重要】出典URLが含まれていない回答は無効とみなされ、「情報がありません。」に自動的に置き換えられます";

const USER_TEMPLATE: &str = "質問: {{question}}

提供された発言内容:
{{context}}

上記の発言内容から質問に答えてください。必ず出典URLを含めて回答してください。";

const EMPTY_USER_TEMPLATE: &str = "質問: {{question}}

提供された発言内容:
（なし）

回答: {{sentinel}}";

const CITATION_TEMPLATE: &str = "{{system}}

重要: 回答には以下のURL群から必ず1つ以上を含めてください: {{urls}}
URLが含まれていない回答は「{{sentinel}}」に置き換えられます。";

/// Build the system/user prompt pair for a question.
///
/// With no passages the user message carries a `（なし）` placeholder and the
/// sentinel as the worked answer. Otherwise every passage is rendered in input
/// order as `[n] text` with its `出典:` line beneath it.
///
/// # Example
/// ```
/// use civic_prompt::{build_prompt, CitedPassage, PromptInput};
///
/// let input = PromptInput::new(
///     "子育て支援について",
///     vec![CitedPassage::new("保育園を増やします。", "https://example.com/1")],
/// );
/// let built = build_prompt(&input).unwrap();
/// assert!(built.user.contains("[1] 保育園を増やします。"));
/// ```
pub fn build_prompt(input: &PromptInput) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt with {} passages", input.passages.len());

    let user = if input.passages.is_empty() {
        render(
            EMPTY_USER_TEMPLATE,
            &serde_json::json!({
                "question": input.question,
                "sentinel": NO_INFORMATION,
            }),
        )?
    } else {
        render(
            USER_TEMPLATE,
            &serde_json::json!({
                "question": input.question,
                "context": render_passages(&input.passages),
            }),
        )?
    };

    let metadata = BuiltPromptMetadata {
        passage_count: input.passages.len(),
        citation_urls: citation_urls(&input.passages),
    };

    Ok(BuiltPrompt::new(SYSTEM_PROMPT.to_string(), user, metadata))
}

/// Append the explicit candidate-URL list to a system prompt.
///
/// Returns `system` unchanged when `urls` is empty.
pub fn with_citation_requirements(system: &str, urls: &[String]) -> AppResult<String> {
    if urls.is_empty() {
        return Ok(system.to_string());
    }

    render(
        CITATION_TEMPLATE,
        &serde_json::json!({
            "system": system,
            "urls": urls.join(", "),
            "sentinel": NO_INFORMATION,
        }),
    )
}

fn render_passages(passages: &[CitedPassage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}\n出典: {}", i + 1, p.text, p.source_url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct non-empty source URLs in first-seen order.
fn citation_urls(passages: &[CitedPassage]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for passage in passages {
        let url = passage.source_url.trim();
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Render a Handlebars template with the given data.
fn render(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
