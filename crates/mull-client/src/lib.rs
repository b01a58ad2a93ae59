//! Client for the local text-generation service.
//!
//! The service is a single `POST` endpoint that accepts a chat transcript and
//! answers either with one JSON object or with a stream of lines (bare JSON
//! or SSE `data:` lines ending with `[DONE]`). Different backends put the
//! generated text under different keys, so everything here is lenient about
//! response shapes.

mod backend;
mod client;
mod envelope;
mod error;
mod lines;
mod message;

pub use backend::{Chunk, ChunkStream, GenerationBackend};
pub use client::GenerationClient;
pub use envelope::{extract_text, text_from_body};
pub use error::ClientError;
pub use lines::{
    decode_line, idle_timeout, line_chunks, raw_chunks, LineEvent, LineSplitter, DONE_SENTINEL,
};
pub use message::{GenerationRequest, Message, Role, TokenField};

/// Default endpoint of the local chat service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8001/chat";

/// Default model name sent with each request.
pub const DEFAULT_MODEL_NAME: &str = "Qwen";
