//! Framing for streamed responses.

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;

use crate::backend::{Chunk, ChunkStream};
use crate::envelope::extract_text;
use crate::error::ClientError;

/// Line that ends a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single streamed line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Text extracted from a JSON envelope.
    Text(String),
    /// A line that is not a JSON object, kept as literal text.
    Literal(String),
    /// The end-of-stream sentinel.
    Done,
    /// Framing or control data with no text.
    Skip,
}

/// Decode one line of a streamed response.
pub fn decode_line(line: &str) -> LineEvent {
    let line = line.trim();
    if line.is_empty() || is_sse_control(line) {
        return LineEvent::Skip;
    }

    let data = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => line,
    };
    if data.is_empty() {
        return LineEvent::Skip;
    }
    if data == DONE_SENTINEL {
        return LineEvent::Done;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(value) if value.is_object() => match extract_text(&value) {
            Some(text) => LineEvent::Text(text.to_string()),
            None => LineEvent::Skip,
        },
        _ => LineEvent::Literal(data.to_string()),
    }
}

/// SSE comments and non-data fields.
fn is_sse_control(line: &str) -> bool {
    line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:")
}

/// Splits a byte stream into lines.
///
/// Bytes are buffered until a newline so multi-byte characters split across
/// network chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_bytes(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// Return the unterminated tail, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(decode_bytes(&raw))
    }
}

fn decode_bytes(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

struct LineState<S> {
    bytes: S,
    splitter: LineSplitter,
    ready: VecDeque<String>,
    finished: bool,
}

/// Turn a stream of byte chunks into a stream of [`Chunk::Line`]s.
pub fn line_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let state = LineState {
        bytes,
        splitter: LineSplitter::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.ready.pop_front() {
                return Some((Ok(Chunk::Line(line)), st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = st.splitter.push(chunk.as_ref());
                    st.ready.extend(lines);
                }
                Some(Err(err)) => {
                    st.finished = true;
                    return Some((Err(err.into()), st));
                }
                None => {
                    st.finished = true;
                    st.ready.extend(st.splitter.finish());
                }
            }
        }
    })
    .boxed()
}

/// End `items` with [`ClientError::Timeout`] when the next item takes longer than `idle`.
///
/// The wait restarts with every item, so a slow but live stream runs to its end.
pub fn idle_timeout<S, T>(items: S, idle: Duration) -> BoxStream<'static, Result<T, ClientError>>
where
    S: Stream<Item = Result<T, ClientError>> + Send + Unpin + 'static,
    T: Send + 'static,
{
    stream::unfold(Some(items), move |state| async move {
        let mut items = state?;
        match tokio::time::timeout(idle, items.next()).await {
            Ok(Some(item)) => Some((item, Some(items))),
            Ok(None) => None,
            Err(_) => Some((Err(ClientError::Timeout(idle)), None)),
        }
    })
    .boxed()
}

/// Decodes UTF-8 text arriving in arbitrary byte chunks.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Decode as much of the buffered input as forms complete characters.
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // An incomplete sequence at the end waits for the next chunk.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };
        let ready: Vec<u8> = self.pending.drain(..valid).collect();
        String::from_utf8_lossy(&ready).into_owned()
    }

    fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// Turn a stream of byte chunks into a stream of [`Chunk::Raw`] text.
pub fn raw_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    stream::unfold(
        (bytes, Utf8Carry::default(), false),
        |(mut bytes, mut carry, finished)| async move {
            if finished {
                return None;
            }
            loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = carry.push(chunk.as_ref());
                        if !text.is_empty() {
                            return Some((Ok(Chunk::Raw(text)), (bytes, carry, false)));
                        }
                    }
                    Some(Err(err)) => return Some((Err(err.into()), (bytes, carry, true))),
                    None => {
                        let rest = carry.finish();
                        if rest.is_empty() {
                            return None;
                        }
                        return Some((Ok(Chunk::Raw(rest)), (bytes, carry, true)));
                    }
                }
            }
        },
    )
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sse_envelope() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(decode_line(line), LineEvent::Text("Hel".to_string()));
    }

    #[test]
    fn test_decode_bare_json() {
        assert_eq!(
            decode_line(r#"{"response": "lo"}"#),
            LineEvent::Text("lo".to_string())
        );
    }

    #[test]
    fn test_decode_done_sentinel() {
        assert_eq!(decode_line("data: [DONE]"), LineEvent::Done);
        assert_eq!(decode_line("[DONE]"), LineEvent::Done);
    }

    #[test]
    fn test_decode_literal_fallback() {
        assert_eq!(
            decode_line("not json at all"),
            LineEvent::Literal("not json at all".to_string())
        );
        assert_eq!(
            decode_line("data: {broken"),
            LineEvent::Literal("{broken".to_string())
        );
        assert_eq!(decode_line("42"), LineEvent::Literal("42".to_string()));
    }

    #[test]
    fn test_decode_control_lines() {
        assert_eq!(decode_line(""), LineEvent::Skip);
        assert_eq!(decode_line("   "), LineEvent::Skip);
        assert_eq!(decode_line(": keep-alive"), LineEvent::Skip);
        assert_eq!(decode_line("event: message"), LineEvent::Skip);
        assert_eq!(decode_line("data:"), LineEvent::Skip);
        assert_eq!(decode_line(r#"{"done": true}"#), LineEvent::Skip);
    }

    #[test]
    fn test_splitter_handles_partial_lines() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"data: a").is_empty());
        assert_eq!(splitter.push(b"bc\r\ndata: d\n"), vec!["data: abc", "data: d"]);
        assert_eq!(splitter.push(b"tail"), Vec::<String>::new());
        assert_eq!(splitter.finish().as_deref(), Some("tail"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_splitter_multibyte_across_chunks() {
        let mut splitter = LineSplitter::new();
        let bytes = "héllo\n".as_bytes();
        assert!(splitter.push(&bytes[..2]).is_empty());
        assert_eq!(splitter.push(&bytes[2..]), vec!["héllo"]);
    }

    #[test]
    fn test_utf8_carry() {
        let mut carry = Utf8Carry::default();
        let bytes = "añb".as_bytes();
        assert_eq!(carry.push(&bytes[..2]), "a");
        assert_eq!(carry.push(&bytes[2..]), "ñb");
        assert_eq!(carry.finish(), "");
    }

    #[tokio::test]
    async fn test_raw_chunks_keep_whitespace() {
        let parts: Vec<Result<&'static [u8], ClientError>> =
            vec![Ok(&b"Thought:"[..]), Ok(&b" "[..]), Ok(&b"\n"[..])];
        let chunks: Vec<Chunk> = raw_chunks(stream::iter(parts))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(
            chunks,
            vec![
                Chunk::Raw("Thought:".to_string()),
                Chunk::Raw(" ".to_string()),
                Chunk::Raw("\n".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_line_chunks_stream() {
        let parts: Vec<Result<&'static [u8], ClientError>> =
            vec![Ok(&b"one\ntw"[..]), Ok(&b"o\n"[..]), Ok(&b"three"[..])];
        let lines: Vec<Chunk> = line_chunks(stream::iter(parts))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(
            lines,
            vec![
                Chunk::Line("one".to_string()),
                Chunk::Line("two".to_string()),
                Chunk::Line("three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_line_chunks_error_ends_stream() {
        let parts: Vec<Result<&'static [u8], ClientError>> = vec![
            Ok(&b"one\n"[..]),
            Err(ClientError::EmptyResponse),
            Ok(&b"never\n"[..]),
        ];
        let items: Vec<Result<Chunk, ClientError>> =
            line_chunks(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ClientError::EmptyResponse)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_silent_stream() {
        let items = stream::iter(vec![Ok(1u32)]).chain(stream::pending()).boxed();
        let got: Vec<Result<u32, ClientError>> =
            idle_timeout(items, Duration::from_secs(10)).collect().await;
        assert_eq!(got.len(), 2);
        assert!(matches!(got[0], Ok(1)));
        assert!(matches!(got[1], Err(ClientError::Timeout(d)) if d == Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_allows_long_live_stream() {
        // Four items five seconds apart outlast the idle window but never idle past it.
        let slow = stream::unfold(0u32, |n| async move {
            if n == 4 {
                return None;
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
            Some((Ok::<_, ClientError>(n), n + 1))
        })
        .boxed();
        let got: Vec<u32> = idle_timeout(slow, Duration::from_secs(10))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(got, vec![0, 1, 2, 3]);
    }
}
