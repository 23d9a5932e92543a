//! Concrete generation provider bindings.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use civic_core::{AppError, AppResult};
use futures::{Stream, StreamExt};

/// Re-frame a byte stream into trimmed, non-empty text lines.
///
/// Lines may straddle network chunks, so bytes are buffered until a newline
/// arrives; whatever remains when the body ends is emitted as a last line.
pub(crate) fn split_lines<S, B>(bytes: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    bytes
        .map(Some)
        .chain(futures::stream::once(futures::future::ready(None)))
        .scan(Vec::<u8>::new(), |buffer, item| {
            let mut lines: Vec<AppResult<String>> = Vec::new();
            match item {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(bytes.as_ref());
                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        push_line(&mut lines, &line);
                    }
                }
                Some(Err(e)) => lines.push(Err(AppError::Llm(format!("Stream error: {}", e)))),
                None => {
                    let rest = std::mem::take(buffer);
                    push_line(&mut lines, &rest);
                }
            }
            futures::future::ready(Some(futures::stream::iter(lines)))
        })
        .flatten()
}

fn push_line(lines: &mut Vec<AppResult<String>>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw).trim().to_string();
    if !text.is_empty() {
        lines.push(Ok(text));
    }
}
