//! Recovery of a final answer after a stream ended without one.
//!
//! Sources are tried in a fixed order and the first one that produces text
//! wins:
//!
//! 1. **Finish**: ask the model to finish the partial reply, with a growing
//!    token budget, up to `max_retries` times.
//! 2. **Summarizer**: ask the model to condense the thinking text.
//! 3. **Heuristic**: take the last sentences of the thinking text locally.
//!
//! The heuristic cannot fail, so every run ends with an answer. Remote
//! failures are logged and treated as a step that produced nothing.

use std::fmt;

use mull_client::{GenerationBackend, GenerationRequest, Message};
use mull_segments::{
    extract_answer, is_truncated, parse_labels, strip_think_blocks, ParsedSegments,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::config::RecoveryPolicy;
use crate::prompt::{finish_messages, summarize_messages};

/// Where the final answer of a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Stream,
    Finish { attempt: u32 },
    Summarizer,
    Heuristic,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerSource::Stream => write!(f, "stream"),
            AnswerSource::Finish { attempt } => write!(f, "finish (attempt {})", attempt),
            AnswerSource::Summarizer => write!(f, "summarizer"),
            AnswerSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Progress of a recovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Streamed,
    Retrying(u32),
    Summarizing,
    Heuristic,
    Done,
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryState::Streamed => write!(f, "streamed"),
            RecoveryState::Retrying(n) => write!(f, "finishing (attempt {})", n),
            RecoveryState::Summarizing => write!(f, "summarizing"),
            RecoveryState::Heuristic => write!(f, "extracting answer"),
            RecoveryState::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Recovered(String),
    NoOp,
}

/// One finish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAttempt {
    pub attempt_number: u32,
    pub token_budget: u32,
    pub outcome: AttemptOutcome,
}

/// The answer a recovery run settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub final_answer: String,
    pub source: AnswerSource,
    pub attempts: Vec<RecoveryAttempt>,
}

impl Resolution {
    /// Resolution for an answer that arrived in the stream.
    pub fn from_stream(answer: impl Into<String>) -> Self {
        Self {
            final_answer: answer.into(),
            source: AnswerSource::Stream,
            attempts: Vec::new(),
        }
    }

    /// Number of finish requests made.
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

/// What the orchestrator knows about the turn.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryContext<'a> {
    pub system_prompt: Option<&'a str>,
    pub last_user: Option<&'a str>,
    pub buffer: &'a str,
    pub segments: &'a ParsedSegments,
}

/// Runs the recovery chain against a backend.
pub struct Orchestrator<'a, B: ?Sized> {
    backend: &'a B,
    policy: &'a RecoveryPolicy,
    sampling: Option<(f32, f32, Option<u64>)>,
}

impl<'a, B: GenerationBackend + ?Sized> Orchestrator<'a, B> {
    pub fn new(backend: &'a B, policy: &'a RecoveryPolicy) -> Self {
        Self {
            backend,
            policy,
            sampling: None,
        }
    }

    /// Sampling parameters sent with recovery requests.
    pub fn with_sampling(mut self, temperature: f32, top_p: f32, seed: Option<u64>) -> Self {
        self.sampling = Some((temperature, top_p, seed));
        self
    }

    /// Resolve a final answer, reporting each state to `on_state`.
    pub async fn run<F>(
        &self,
        ctx: RecoveryContext<'_>,
        cancel: &CancelFlag,
        mut on_state: F,
    ) -> Resolution
    where
        F: FnMut(&RecoveryState),
    {
        on_state(&RecoveryState::Streamed);

        if let Some(answer) = ctx.segments.answer() {
            on_state(&RecoveryState::Done);
            return Resolution::from_stream(answer);
        }

        let thinking = ctx
            .segments
            .thinking
            .as_deref()
            .filter(|t| !t.trim().is_empty());
        let mut attempts = Vec::new();

        if self.should_retry(ctx) {
            let mut budget = self.policy.finish_tokens_initial;
            for attempt in 1..=self.policy.max_retries {
                if cancel.is_cancelled() {
                    info!("Recovery cancelled before finish attempt {}", attempt);
                    break;
                }
                on_state(&RecoveryState::Retrying(attempt));
                debug!("Finish attempt {} with budget {}", attempt, budget);

                let messages = finish_messages(ctx.system_prompt, ctx.last_user, ctx.buffer);
                let answer = self
                    .request(messages, budget)
                    .await
                    .and_then(|text| finish_answer(&text));

                match answer {
                    Some(answer) => {
                        attempts.push(RecoveryAttempt {
                            attempt_number: attempt,
                            token_budget: budget,
                            outcome: AttemptOutcome::Recovered(answer.clone()),
                        });
                        on_state(&RecoveryState::Done);
                        return Resolution {
                            final_answer: answer,
                            source: AnswerSource::Finish { attempt },
                            attempts,
                        };
                    }
                    None => {
                        attempts.push(RecoveryAttempt {
                            attempt_number: attempt,
                            token_budget: budget,
                            outcome: AttemptOutcome::NoOp,
                        });
                        budget = budget.saturating_add(self.policy.finish_tokens_increment);
                    }
                }
            }
        }

        if let Some(thinking) = thinking.filter(|_| self.policy.summarize) {
            if cancel.is_cancelled() {
                info!("Recovery cancelled before summarizing");
            } else {
                on_state(&RecoveryState::Summarizing);
                let summary = self
                    .request(summarize_messages(thinking), self.policy.summarize_tokens)
                    .await
                    .map(|text| strip_think_blocks(&text))
                    .filter(|text| !text.is_empty());

                if let Some(summary) = summary {
                    on_state(&RecoveryState::Done);
                    return Resolution {
                        final_answer: summary,
                        source: AnswerSource::Summarizer,
                        attempts,
                    };
                }
            }
        }

        on_state(&RecoveryState::Heuristic);
        let final_answer = extract_answer(thinking);
        on_state(&RecoveryState::Done);

        Resolution {
            final_answer,
            source: AnswerSource::Heuristic,
            attempts,
        }
    }

    fn should_retry(&self, ctx: RecoveryContext<'_>) -> bool {
        self.policy.auto_retry && (is_truncated(ctx.buffer) || !ctx.segments.has_answer())
    }

    /// One non-streaming request. Any failure or blank text gives `None`.
    async fn request(&self, messages: Vec<Message>, max_tokens: u32) -> Option<String> {
        let mut request = GenerationRequest::new(messages, max_tokens).streaming(false);
        if let Some((temperature, top_p, seed)) = self.sampling {
            request = request.with_sampling(temperature, top_p, seed);
        }

        match self.backend.complete(&request, self.policy.timeout).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("Recovery request returned no text");
                None
            }
            Err(e) => {
                warn!("Recovery request failed: {}", e);
                None
            }
        }
    }
}

/// Answer text from a finish response: the labeled final answer if there is
/// one, otherwise the whole response.
fn finish_answer(response: &str) -> Option<String> {
    let cleaned = strip_think_blocks(response);
    let answer = match parse_labels(&cleaned).answer() {
        Some(answer) => answer.to_string(),
        None => cleaned.trim().to_string(),
    };
    Some(answer).filter(|a| !a.is_empty())
}
