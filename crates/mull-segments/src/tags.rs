//! `<think>` ... `</think>` tag framing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ParsedSegments;

/// Tag opening a thinking block.
pub const OPEN_TAG: &str = "<think>";
/// Tag closing a thinking block.
pub const CLOSE_TAG: &str = "</think>";

lazy_static! {
    static ref THINK_BLOCK: Regex =
        Regex::new(r"(?is)<think>.*?</think>").expect("valid think block pattern");
}

/// Split `text` into the part inside a think block and the part after it.
///
/// - both tags: inside is thinking, the rest is the answer
/// - only the open tag: still thinking, no answer yet
/// - only the close tag: the model's template opened the block for us, so
///   everything before it is thinking
/// - no tags: all thinking
pub fn parse_tags(text: &str) -> ParsedSegments {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let open = lower.find(OPEN_TAG);
    let close = match open {
        Some(o) => lower[o + OPEN_TAG.len()..]
            .find(CLOSE_TAG)
            .map(|c| c + o + OPEN_TAG.len()),
        None => lower.find(CLOSE_TAG),
    };

    match (open, close) {
        (Some(o), Some(c)) => {
            let inside = &text[o + OPEN_TAG.len()..c];
            let before = text[..o].trim();
            let after = text[c + CLOSE_TAG.len()..].trim();
            let answer = match (before.is_empty(), after.is_empty()) {
                (true, _) => after.to_string(),
                (false, true) => before.to_string(),
                (false, false) => format!("{}\n\n{}", before, after),
            };
            ParsedSegments {
                thinking: non_empty(inside),
                final_answer: Some(answer),
            }
        }
        (Some(o), None) => ParsedSegments {
            thinking: non_empty(&text[o + OPEN_TAG.len()..]),
            final_answer: None,
        },
        (None, Some(c)) => ParsedSegments {
            thinking: non_empty(&text[..c]),
            final_answer: Some(text[c + CLOSE_TAG.len()..].trim().to_string()),
        },
        (None, None) => ParsedSegments {
            thinking: non_empty(text),
            final_answer: None,
        },
    }
}

/// Remove every complete think block and trim what is left.
pub fn strip_think_blocks(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
