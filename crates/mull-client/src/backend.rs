//! Backend abstraction used by the chat layer.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::time::Duration;

use crate::error::ClientError;
use crate::message::GenerationRequest;

/// One unit of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A framed line (bare JSON, SSE `data:` line, or sentinel).
    Line(String),
    /// Unframed text from a plain-text stream, used verbatim.
    Raw(String),
}

/// Stream of response chunks. An `Err` item ends the stream.
pub type ChunkStream = BoxStream<'static, Result<Chunk, ClientError>>;

/// A text-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run a single request and return the generated text.
    ///
    /// Empty output is reported as [`ClientError::EmptyResponse`].
    async fn complete(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<String, ClientError>;

    /// Start a streaming request.
    async fn stream(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<ChunkStream, ClientError>;
}
