//! Chat engine - runs one turn from user input to a final answer.

use futures_util::stream;
use mull_client::{Chunk, GenerationBackend, GenerationRequest, Message};
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::config::ChatConfig;
use crate::consumer::{SegmentUpdate, StreamConsumer, StreamEnd, StreamOutcome};
use crate::recovery::{
    AnswerSource, Orchestrator, RecoveryAttempt, RecoveryContext, RecoveryState, Resolution,
};
use crate::session::Transcript;

/// Per-turn values passed in by the caller.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    pub cancel: CancelFlag,
}

impl TurnContext {
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

/// Result of a finished turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub thinking: Option<String>,
    pub final_answer: String,
    pub source: AnswerSource,
    pub attempts: Vec<RecoveryAttempt>,
    pub stream_end: StreamEnd,
    /// Everything the model produced in the main request.
    pub buffer: String,
}

/// Engine driving chat turns against a generation backend.
pub struct ChatEngine<B> {
    backend: B,
    config: ChatConfig,
}

impl<B: GenerationBackend> ChatEngine<B> {
    pub fn new(backend: B, config: ChatConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a turn for `user_input`.
    ///
    /// `on_update` receives throttled segment snapshots while the reply
    /// streams in, `on_state` receives recovery progress. The user message
    /// and the final answer are appended to `transcript` once the turn is
    /// resolved; nothing is appended before that.
    pub async fn run_turn<U, S>(
        &self,
        transcript: &mut Transcript,
        user_input: &str,
        ctx: &TurnContext,
        mut on_update: U,
        on_state: S,
    ) -> TurnOutcome
    where
        U: FnMut(&SegmentUpdate),
        S: FnMut(&RecoveryState),
    {
        let user_input = user_input.trim();
        let mut messages = transcript.messages().to_vec();
        messages.push(Message::user(user_input));

        let request = GenerationRequest::new(messages, self.config.max_tokens)
            .streaming(self.config.stream)
            .with_sampling(self.config.temperature, self.config.top_p, self.config.seed);
        let consumer = StreamConsumer::new(self.config.parse_mode, self.config.update_interval);

        info!(
            "Starting turn ({} messages, stream: {})",
            request.messages.len(),
            self.config.stream
        );

        let outcome = if self.config.stream {
            match self.backend.stream(&request, self.config.stream_timeout).await {
                Ok(chunks) => consumer.consume(chunks, &ctx.cancel, &mut on_update).await,
                Err(e) => {
                    warn!("Failed to open stream: {}", e);
                    StreamOutcome::failed(e.to_string())
                }
            }
        } else {
            match self.backend.complete(&request, self.config.stream_timeout).await {
                Ok(text) => {
                    let whole = stream::iter(vec![Ok(Chunk::Raw(text))]);
                    consumer.consume(whole, &ctx.cancel, &mut on_update).await
                }
                Err(e) => {
                    warn!("Generation request failed: {}", e);
                    StreamOutcome::failed(e.to_string())
                }
            }
        };

        debug!(
            "Main request ended: {:?} after {} fragments ({} bytes)",
            outcome.end,
            outcome.fragments,
            outcome.buffer.len()
        );

        let resolution = match outcome.segments.answer() {
            Some(answer) => Resolution::from_stream(answer),
            None => {
                let recovery = RecoveryContext {
                    system_prompt: transcript.system(),
                    last_user: Some(user_input),
                    buffer: &outcome.buffer,
                    segments: &outcome.segments,
                };
                Orchestrator::new(&self.backend, &self.config.recovery)
                    .with_sampling(self.config.temperature, self.config.top_p, self.config.seed)
                    .run(recovery, &ctx.cancel, on_state)
                    .await
            }
        };

        info!("Turn resolved from {}", resolution.source);

        transcript.push(Message::user(user_input));
        transcript.push(Message::assistant(resolution.final_answer.clone()));

        TurnOutcome {
            thinking: outcome.segments.thinking,
            final_answer: resolution.final_answer,
            source: resolution.source,
            attempts: resolution.attempts,
            stream_end: outcome.end,
            buffer: outcome.buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use mull_client::{ClientError, Role};
    use mull_segments::ParseMode;

    fn config() -> ChatConfig {
        ChatConfig::builder().system_prompt("sys").build()
    }

    #[tokio::test]
    async fn test_streamed_answer_commits_exchange() {
        let backend = ScriptedBackend::new().with_stream_lines(&[
            r#"{"token": "Thought: easy. "}"#,
            r#"{"token": "Final Answer: yes"}"#,
            "[DONE]",
        ]);
        let engine = ChatEngine::new(backend, config());
        let mut transcript = Transcript::with_system("sys");

        let outcome = engine
            .run_turn(
                &mut transcript,
                "  is it?  ",
                &TurnContext::default(),
                |_| {},
                |_| {},
            )
            .await;

        assert_eq!(outcome.source, AnswerSource::Stream);
        assert_eq!(outcome.final_answer, "yes");
        assert_eq!(outcome.thinking.as_deref(), Some("easy."));
        assert_eq!(outcome.stream_end, StreamEnd::Completed);

        let messages = transcript.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "is it?");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "yes");

        let request = &engine.backend().requests()[0];
        assert!(request.stream);
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.messages.last().map(|m| m.content.as_str()), Some("is it?"));
    }

    #[tokio::test]
    async fn test_non_streaming_turn() {
        let backend = ScriptedBackend::new().with_completion("<think>quick</think>Paris.");
        let config = ChatConfig::builder()
            .stream(false)
            .parse_mode(ParseMode::Tags)
            .build();
        let engine = ChatEngine::new(backend, config);
        let mut transcript = Transcript::new();

        let outcome = engine
            .run_turn(
                &mut transcript,
                "capital?",
                &TurnContext::default(),
                |_| {},
                |_| {},
            )
            .await;

        assert_eq!(outcome.final_answer, "Paris.");
        assert_eq!(outcome.thinking.as_deref(), Some("quick"));
        assert!(!engine.backend().requests()[0].stream);
    }

    #[tokio::test]
    async fn test_stream_open_failure_still_answers() {
        let backend = ScriptedBackend::new()
            .with_stream_error(ClientError::ServerNotRunning(
                "http://127.0.0.1:8001/chat".to_string(),
            ))
            .with_completion("Final Answer: recovered");
        let engine = ChatEngine::new(backend, config());
        let mut transcript = Transcript::new();

        let outcome = engine
            .run_turn(
                &mut transcript,
                "hello",
                &TurnContext::default(),
                |_| {},
                |_| {},
            )
            .await;

        assert!(outcome.stream_end.is_failed());
        assert_eq!(outcome.source, AnswerSource::Finish { attempt: 1 });
        assert_eq!(outcome.final_answer, "recovered");
        assert_eq!(engine.backend().request_count(), 2);
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_open_failure_without_recovery() {
        let backend = ScriptedBackend::new().with_stream_error(ClientError::EmptyResponse);
        let config = ChatConfig::builder().auto_retry(false).build();
        let engine = ChatEngine::new(backend, config);
        let mut transcript = Transcript::new();

        let outcome = engine
            .run_turn(
                &mut transcript,
                "hello",
                &TurnContext::default(),
                |_| {},
                |_| {},
            )
            .await;

        assert_eq!(outcome.source, AnswerSource::Heuristic);
        assert_eq!(outcome.final_answer, mull_segments::NO_RESPONSE);
        assert_eq!(engine.backend().request_count(), 1);
    }
}
