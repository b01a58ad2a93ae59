//! # Mull Segments
//!
//! Splits partially generated model output into a "thinking" segment and a
//! "final answer" segment.
//!
//! Everything in this crate is a pure function over text. The functions are
//! meant to be called again and again on a buffer that only ever grows while
//! a response streams in, so each call re-scans the whole buffer: a label that
//! arrives late can change where earlier sections end.
//!
//! Two framings are supported:
//!
//! - **Labels**: `Thought:`, `Reasoning:` and `Final Answer:` sections.
//! - **Tags**: a `<think>` ... `</think>` block followed by the answer.
//!
//! ## Example
//!
//! ```
//! use mull_segments::{parse, ParseMode};
//!
//! let segments = parse("Thought: 2 + 2. Final Answer: 4", ParseMode::Labels);
//! assert_eq!(segments.thinking.as_deref(), Some("2 + 2."));
//! assert_eq!(segments.final_answer.as_deref(), Some("4"));
//! ```

mod heuristic;
mod labels;
mod tags;
mod truncation;

pub use heuristic::{extract_answer, split_sentences, FALLBACK_CHAR_BUDGET, NO_RESPONSE};
pub use labels::parse_labels;
pub use tags::{parse_tags, strip_think_blocks, CLOSE_TAG, OPEN_TAG};
pub use truncation::is_truncated;

use std::fmt;
use std::str::FromStr;

/// The two halves of a model response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSegments {
    /// Chain-of-thought text, shown apart from the answer.
    pub thinking: Option<String>,
    /// User-facing answer. `None` until its marker has been seen.
    pub final_answer: Option<String>,
}

impl ParsedSegments {
    /// The final answer, if one was found and it is not blank.
    pub fn answer(&self) -> Option<&str> {
        self.final_answer.as_deref().filter(|a| !a.is_empty())
    }

    /// Whether a non-blank final answer is present.
    pub fn has_answer(&self) -> bool {
        self.answer().is_some()
    }
}

/// How a response marks its thinking and answer sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// `Thought:` / `Reasoning:` / `Final Answer:` labels.
    #[default]
    Labels,
    /// `<think>` ... `</think>` tags.
    Tags,
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Labels => write!(f, "labels"),
            ParseMode::Tags => write!(f, "tags"),
        }
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "labels" | "label" => Ok(ParseMode::Labels),
            "tags" | "tag" | "think" => Ok(ParseMode::Tags),
            other => Err(format!("unknown parse mode: {}", other)),
        }
    }
}

/// Split `text` into thinking and final answer using the given framing.
pub fn parse(text: &str, mode: ParseMode) -> ParsedSegments {
    match mode {
        ParseMode::Labels => parse_labels(text),
        ParseMode::Tags => parse_tags(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_from_str() {
        assert_eq!("labels".parse::<ParseMode>(), Ok(ParseMode::Labels));
        assert_eq!(" TAGS ".parse::<ParseMode>(), Ok(ParseMode::Tags));
        assert!("xml".parse::<ParseMode>().is_err());
    }

    #[test]
    fn test_parse_dispatches_on_mode() {
        let text = "<think>hmm</think>Thought: x Final Answer: y";
        assert_eq!(parse(text, ParseMode::Tags).thinking.as_deref(), Some("hmm"));
        assert_eq!(
            parse(text, ParseMode::Labels).final_answer.as_deref(),
            Some("y")
        );
    }

    #[test]
    fn test_empty_answer_is_not_an_answer() {
        let segments = parse("Thought: still going Final Answer:", ParseMode::Labels);
        assert_eq!(segments.final_answer.as_deref(), Some(""));
        assert!(!segments.has_answer());
    }
}
