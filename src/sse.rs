//! Server-Sent Events (SSE) processing for streaming completions.
//!
//! Groq streams OpenAI-style events: every event is a `data:` line holding a
//! JSON chunk, events are separated by a blank line, and the literal
//! `data: [DONE]` ends the stream.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::ChatCompletionChunk;
use crate::{Error, Result};

/// A single decoded SSE frame.
#[derive(Debug)]
enum Frame {
    /// A completion chunk, or the error from decoding it.
    Chunk(Result<ChatCompletionChunk>),
    /// The `[DONE]` terminator.
    Done,
    /// A comment, keep-alive, or event without data.
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// Bytes are buffered until a full event is available, so UTF-8 sequences and
/// JSON documents split across network reads are reassembled before parsing.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, Vec::<u8>::new(), false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                while let Some((frame, consumed)) = extract_frame(&buffer) {
                    buffer.drain(..consumed);
                    match frame {
                        Frame::Chunk(chunk) => {
                            STREAM_EVENTS.click();
                            if chunk.is_err() {
                                STREAM_ERRORS.click();
                            }
                            return Some((chunk, (stream, buffer, false)));
                        }
                        Frame::Done => return None,
                        Frame::Skip => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // A final event without its trailing blank line.
                        if buffer.iter().any(|b| !b.is_ascii_whitespace()) {
                            buffer.extend_from_slice(b"\n\n");
                            if let Some((Frame::Chunk(chunk), _)) = extract_frame(&buffer) {
                                return Some((chunk, (stream, Vec::new(), true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract one complete SSE frame from the front of `buffer`.
///
/// Returns the frame and the number of bytes it occupied, or `None` when the
/// buffer does not yet hold a complete event.
fn extract_frame(buffer: &[u8]) -> Option<(Frame, usize)> {
    let (end, separator_len) = find_event_end(buffer)?;
    let consumed = end + separator_len;
    let event_text = match std::str::from_utf8(&buffer[..end]) {
        Ok(text) => text,
        Err(e) => {
            return Some((
                Frame::Chunk(Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ))),
                consumed,
            ));
        }
    };

    let data = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    let frame = match data.as_str() {
        "" => Frame::Skip,
        "[DONE]" => Frame::Done,
        json => Frame::Chunk(serde_json::from_str::<ChatCompletionChunk>(json).map_err(|e| {
            Error::serialization(format!("Failed to parse event JSON: {e}"), Some(Box::new(e)))
        })),
    };
    Some((frame, consumed))
}

/// Find the first blank-line event separator, accepting `\n\n` and `\r\n\r\n`.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}
