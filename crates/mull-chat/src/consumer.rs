//! Stream consumption with throttled display updates.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use mull_client::{decode_line, Chunk, ClientError, LineEvent};
use mull_segments::{parse, ParseMode, ParsedSegments};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::cancel::CancelFlag;

/// Snapshot handed to the display observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentUpdate {
    pub thinking: Option<String>,
    pub final_answer: Option<String>,
    /// Bytes accumulated so far.
    pub buffer_len: usize,
    /// Set on the emission made after the stream ended.
    pub is_final: bool,
}

/// How a stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The backend closed the stream or sent the end sentinel.
    Completed,
    /// The cancel flag was set.
    Cancelled,
    /// The transport failed. The partial buffer is kept.
    Failed(String),
}

impl StreamEnd {
    pub fn is_failed(&self) -> bool {
        matches!(self, StreamEnd::Failed(_))
    }
}

/// Everything a finished stream produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub buffer: String,
    pub segments: ParsedSegments,
    pub end: StreamEnd,
    /// Number of fragments appended to the buffer.
    pub fragments: usize,
}

impl StreamOutcome {
    /// Outcome of a stream that never opened.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            segments: ParsedSegments::default(),
            end: StreamEnd::Failed(message.into()),
            fragments: 0,
        }
    }
}

/// Pulls chunks into a buffer and reports parsed segments as they change.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    mode: ParseMode,
    min_interval: Duration,
}

impl StreamConsumer {
    pub fn new(mode: ParseMode, min_interval: Duration) -> Self {
        Self { mode, min_interval }
    }

    /// Consume `chunks` until the stream ends, fails, or `cancel` is set.
    ///
    /// `on_update` is called at most once per throttle interval while
    /// segments change, and exactly once more at the end.
    pub async fn consume<S, F>(
        &self,
        mut chunks: S,
        cancel: &CancelFlag,
        mut on_update: F,
    ) -> StreamOutcome
    where
        S: Stream<Item = Result<Chunk, ClientError>> + Unpin,
        F: FnMut(&SegmentUpdate),
    {
        let mut buffer = String::new();
        let mut segments = ParsedSegments::default();
        let mut emitted = ParsedSegments::default();
        let mut last_emit: Option<Instant> = None;
        let mut fragments = 0;

        let end = loop {
            let Some(item) = chunks.next().await else {
                break StreamEnd::Completed;
            };
            if cancel.is_cancelled() {
                debug!("Stream cancelled after {} fragments", fragments);
                break StreamEnd::Cancelled;
            }

            let fragment = match item {
                Ok(Chunk::Raw(text)) => text,
                Ok(Chunk::Line(line)) => {
                    trace!(line = %line, "raw stream line");
                    match decode_line(&line) {
                        LineEvent::Text(text) => text,
                        LineEvent::Literal(text) => text + "\n",
                        LineEvent::Done => break StreamEnd::Completed,
                        LineEvent::Skip => continue,
                    }
                }
                Err(e) => {
                    warn!("Stream failed after {} fragments: {}", fragments, e);
                    break StreamEnd::Failed(e.to_string());
                }
            };
            if fragment.is_empty() {
                continue;
            }

            buffer.push_str(&fragment);
            fragments += 1;
            segments = parse(&buffer, self.mode);

            let due = last_emit.map_or(true, |at| at.elapsed() >= self.min_interval);
            if due && segments != emitted {
                on_update(&snapshot(&segments, buffer.len(), false));
                emitted = segments.clone();
                last_emit = Some(Instant::now());
            }
        };

        on_update(&snapshot(&segments, buffer.len(), true));

        StreamOutcome {
            buffer,
            segments,
            end,
            fragments,
        }
    }
}

fn snapshot(segments: &ParsedSegments, buffer_len: usize, is_final: bool) -> SegmentUpdate {
    SegmentUpdate {
        thinking: segments.thinking.clone(),
        final_answer: segments.final_answer.clone(),
        buffer_len,
        is_final,
    }
}
