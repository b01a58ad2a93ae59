//! Local extractive fallback for when no final answer could be obtained.

/// Shown when there is nothing at all to build an answer from.
pub const NO_RESPONSE: &str = "No response generated by model.";

/// Character budget for the last-resort truncated answer.
pub const FALLBACK_CHAR_BUDGET: usize = 512;

/// Build a final answer from the thinking text alone.
///
/// Takes the last two sentences. If no sentence can be extracted, the first
/// [`FALLBACK_CHAR_BUDGET`] characters are used with an ellipsis. Without any
/// thinking text the fixed [`NO_RESPONSE`] message is returned.
pub fn extract_answer(thinking: Option<&str>) -> String {
    let thinking = match thinking.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t,
        None => return NO_RESPONSE.to_string(),
    };

    let sentences = split_sentences(thinking);
    if sentences.is_empty() {
        return truncate_with_ellipsis(thinking, FALLBACK_CHAR_BUDGET);
    }

    sentences[sentences.len().saturating_sub(2)..].join(" ")
}

/// Split text after `.`, `!` or `?` when followed by whitespace.
///
/// Returned sentences are trimmed; empty ones are dropped. Text without any
/// terminal punctuation has no sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        match chars.peek() {
            Some(&(next_index, next)) if next.is_whitespace() => {
                pieces.push(&text[start..next_index]);
                while let Some(&(_, w)) = chars.peek() {
                    if !w.is_whitespace() {
                        break;
                    }
                    chars.next();
                }
                start = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
            }
            _ => {}
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    let sentences: Vec<&str> = pieces
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.iter().any(|s| s.ends_with(['.', '!', '?'])) {
        sentences
    } else {
        Vec::new()
    }
}

fn truncate_with_ellipsis(text: &str, budget: usize) -> String {
    let mut out: String = text.chars().take(budget).collect();
    out.push_str("...");
    out
}
