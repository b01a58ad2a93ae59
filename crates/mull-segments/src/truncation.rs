//! Heuristic detection of generations cut off by a token budget.

/// Whether `buffer` looks like it stopped mid-word or mid-sentence.
///
/// This is a guess, not a classifier: it only looks at how the text ends.
pub fn is_truncated(buffer: &str) -> bool {
    let trimmed = buffer.trim_end();
    let last = match trimmed.chars().last() {
        Some(c) => c,
        None => return false,
    };

    if !last.is_alphanumeric() {
        return false;
    }

    !ends_with_terminal_punctuation(tail(trimmed, 3))
}

/// The last `n` characters of `s`.
fn tail(s: &str, n: usize) -> &str {
    let start = s
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

fn ends_with_terminal_punctuation(s: &str) -> bool {
    s.trim_end().ends_with(|c: char| matches!(c, '.' | '!' | '?'))
}
