//! In-memory backend for tests.
//!
//! Responses are queued up front and handed out in order. Every request is
//! recorded so tests can assert on what was sent.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use mull_client::{Chunk, ChunkStream, ClientError, GenerationBackend, GenerationRequest};

type ScriptedStream = Result<Vec<Result<Chunk, ClientError>>, ClientError>;

/// A [`GenerationBackend`] that replays scripted responses.
///
/// An exhausted `complete` queue answers with [`ClientError::EmptyResponse`],
/// an exhausted stream queue with an empty stream.
#[derive(Default)]
pub struct ScriptedBackend {
    completions: Mutex<VecDeque<Result<String, ClientError>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue text for the next `complete` call. Blank text is returned as is.
    pub fn with_completion(self, text: impl Into<String>) -> Self {
        lock(&self.completions).push_back(Ok(text.into()));
        self
    }

    pub fn with_completion_error(self, error: ClientError) -> Self {
        lock(&self.completions).push_back(Err(error));
        self
    }

    /// Queue a stream of framed lines.
    pub fn with_stream_lines<S: AsRef<str>>(self, lines: &[S]) -> Self {
        let chunks = lines
            .iter()
            .map(|l| Ok(Chunk::Line(l.as_ref().to_string())))
            .collect();
        lock(&self.streams).push_back(Ok(chunks));
        self
    }

    /// Queue a stream of arbitrary items, errors included.
    pub fn with_stream_chunks(self, chunks: Vec<Result<Chunk, ClientError>>) -> Self {
        lock(&self.streams).push_back(Ok(chunks));
        self
    }

    /// Queue a stream that fails to open.
    pub fn with_stream_error(self, error: ClientError) -> Self {
        lock(&self.streams).push_back(Err(error));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn record(&self, request: &GenerationRequest) {
        lock(&self.requests).push(request.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(
        &self,
        request: &GenerationRequest,
        _timeout: Duration,
    ) -> Result<String, ClientError> {
        self.record(request);
        lock(&self.completions)
            .pop_front()
            .unwrap_or(Err(ClientError::EmptyResponse))
    }

    async fn stream(
        &self,
        request: &GenerationRequest,
        _timeout: Duration,
    ) -> Result<ChunkStream, ClientError> {
        self.record(request);
        let chunks = lock(&self.streams).pop_front().unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(stream::iter(chunks).boxed())
    }
}
