//! `Thought:` / `Reasoning:` / `Final Answer:` label framing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ParsedSegments;

lazy_static! {
    static ref THOUGHT: Regex =
        Regex::new(r"(?i)thought:").expect("valid thought label pattern");
    static ref REASONING: Regex =
        Regex::new(r"(?i)reasoning:").expect("valid reasoning label pattern");
    // Upstream chunking sometimes drops the leading "F".
    static ref FINAL_ANSWER: Regex =
        Regex::new(r"(?i)f?inal answer:").expect("valid final answer label pattern");
}

/// Characters skipped at the very start of a buffer before labels are matched.
const LEADING_NOISE: &[char] = &['\'', '"', '`', ',', '.', '-'];

/// Parse labeled sections out of `text`.
///
/// The thinking segment joins the `Thought:` and `Reasoning:` bodies with a
/// blank line. The final answer is everything after `Final Answer:`. Text
/// without any label is all thinking.
pub fn parse_labels(text: &str) -> ParsedSegments {
    let s = strip_leading_noise(text.trim());
    if s.is_empty() {
        return ParsedSegments::default();
    }

    // Sections are taken in source order: nothing after the final label is
    // thinking, and `Reasoning:` only counts after `Thought:`.
    let final_label = FINAL_ANSWER.find(s);
    let head = &s[..final_label.map_or(s.len(), |m| m.start())];
    let thought_label = THOUGHT.find(head);
    let reasoning_label = REASONING.find_at(head, thought_label.map_or(0, |m| m.end()));

    let thought = thought_label.map(|m| {
        let end = reasoning_label.map_or(head.len(), |r| r.start());
        head[m.end()..end].trim()
    });
    let reasoning = reasoning_label.map(|m| head[m.end()..].trim());

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(thought.filter(|t| !t.is_empty()));
    parts.extend(reasoning.filter(|r| !r.is_empty()));

    if thought.is_none() && reasoning.is_none() {
        match final_label {
            Some(label) => {
                let preamble = s[..label.start()].trim();
                if !preamble.is_empty() {
                    parts.push(preamble);
                }
            }
            None => parts.push(s),
        }
    }

    let thinking = if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    };
    let final_answer = final_label.map(|m| s[m.end()..].trim().to_string());

    ParsedSegments {
        thinking,
        final_answer,
    }
}

fn strip_leading_noise(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace() || LEADING_NOISE.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> (Option<String>, Option<String>) {
        let segments = parse_labels(text);
        (segments.thinking, segments.final_answer)
    }

    #[test]
    fn test_all_three_sections() {
        let (thinking, answer) = split("Thought: A Reasoning: B Final Answer: C");
        assert_eq!(thinking.as_deref(), Some("A\n\nB"));
        assert_eq!(answer.as_deref(), Some("C"));
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let (thinking, answer) = split("THOUGHT: a\nreasoning: b\nfinal ANSWER: c");
        assert_eq!(thinking.as_deref(), Some("a\n\nb"));
        assert_eq!(answer.as_deref(), Some("c"));
    }

    #[test]
    fn test_no_labels_is_all_thinking() {
        let (thinking, answer) = split("  just some text, no labels here \n");
        assert_eq!(thinking.as_deref(), Some("just some text, no labels here"));
        assert_eq!(answer, None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split(""), (None, None));
        assert_eq!(split("   \n\t"), (None, None));
        assert_eq!(split("\"'`"), (None, None));
    }

    #[test]
    fn test_dropped_leading_f() {
        let (thinking, answer) = split("Thought: carry the one. inal Answer: 42");
        assert_eq!(thinking.as_deref(), Some("carry the one."));
        assert_eq!(answer.as_deref(), Some("42"));
    }

    #[test]
    fn test_only_final_label_uses_preamble_as_thinking() {
        let (thinking, answer) = split("The sum is easy.\nFinal Answer: 7");
        assert_eq!(thinking.as_deref(), Some("The sum is easy."));
        assert_eq!(answer.as_deref(), Some("7"));

        let (thinking, answer) = split("Final Answer: 7");
        assert_eq!(thinking, None);
        assert_eq!(answer.as_deref(), Some("7"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let (thinking, answer) = split("Thought: Reasoning: only this Final Answer: ok");
        assert_eq!(thinking.as_deref(), Some("only this"));
        assert_eq!(answer.as_deref(), Some("ok"));

        let (thinking, _) = split("Thought:   Reasoning:   Final Answer: ok");
        assert_eq!(thinking, None);
    }

    #[test]
    fn test_leading_noise_is_stripped() {
        let (thinking, answer) = split("\",. - Thought: x Final Answer: y");
        assert_eq!(thinking.as_deref(), Some("x"));
        assert_eq!(answer.as_deref(), Some("y"));

        let (thinking, _) = split("`... plain");
        assert_eq!(thinking.as_deref(), Some("plain"));
    }

    #[test]
    fn test_label_without_body_yet() {
        let (thinking, answer) = split("Thought: checking Final Answer:");
        assert_eq!(thinking.as_deref(), Some("checking"));
        assert_eq!(answer.as_deref(), Some(""));
    }

    #[test]
    fn test_growing_buffer_is_monotonic() {
        let full = "Thought: look up the capital. Reasoning: it is Paris. \
                    Final Answer: Paris is the capital of France.";
        let boundaries: Vec<usize> = full.char_indices().map(|(i, _)| i).collect();

        let mut previous_answer: Option<String> = None;
        for &end in boundaries.iter().skip(1) {
            let answer = parse_labels(&full[..end]).final_answer;
            if let Some(prev) = &previous_answer {
                let current = answer.as_deref().expect("answer never disappears");
                assert!(
                    current.starts_with(prev.as_str()),
                    "{:?} does not extend {:?}",
                    current,
                    prev
                );
            }
            previous_answer = answer;
        }
        assert_eq!(
            previous_answer.as_deref(),
            Some("Paris is the capital of France")
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Thought: a. Reasoning: b. Final Answer: c.";
        assert_eq!(parse_labels(text), parse_labels(text));
    }

    #[test]
    fn test_streamed_sections_without_answer() {
        let (thinking, answer) = split("Thought: check facts. Reasoning: ok. ");
        assert_eq!(thinking.as_deref(), Some("check facts.\n\nok."));
        assert_eq!(answer, None);
    }

    #[test]
    fn test_labels_inside_answer_stay_in_answer() {
        let (thinking, answer) =
            split("Thought: check. Final Answer: Use the Reasoning: section of the doc.");
        assert_eq!(thinking.as_deref(), Some("check."));
        assert_eq!(answer.as_deref(), Some("Use the Reasoning: section of the doc."));

        let (thinking, answer) = split("The plan. Final Answer: Thought: it works");
        assert_eq!(thinking.as_deref(), Some("The plan."));
        assert_eq!(answer.as_deref(), Some("Thought: it works"));
    }

    #[test]
    fn test_reasoning_before_thought_is_ignored() {
        let (thinking, answer) = split("Reasoning: early Thought: late Final Answer: done");
        assert_eq!(thinking.as_deref(), Some("late"));
        assert_eq!(answer.as_deref(), Some("done"));
    }
}
