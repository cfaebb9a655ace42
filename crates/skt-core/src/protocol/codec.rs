//! Line codec for the skt message exchange protocol.
//!
//! Wire format, client → server:
//! ```text
//! [text: up to 254 bytes]['\n']
//! ```
//! Wire format, server → client: exactly one of `"Connect OK\n"` or `"ACK\n"`.
//!
//! The server never frames anything, so this codec only exists to keep the
//! client honest: outbound lines are clamped to what one server read can
//! observe, and replies are split on newlines because several may arrive in
//! the same TCP segment.

use thiserror::Error;

use crate::protocol::messages::{Reply, ACK_LINE, GREETING_LINE, MAX_PAYLOAD};

/// Errors that can occur while decoding a server reply.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// No complete newline-terminated line is available yet.
    #[error("incomplete reply: {available} byte(s) without a line terminator")]
    Incomplete { available: usize },

    /// A complete line arrived that is not part of the reply vocabulary.
    #[error("unrecognized reply: {0:?}")]
    UnrecognizedReply(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `text` as one newline-terminated line of at most [`MAX_PAYLOAD`]
/// bytes.
///
/// Any trailing `"\n"` or `"\r\n"` on the input is replaced by a single
/// `'\n'`.  Text that would exceed the limit is cut on a UTF-8 character
/// boundary so the server observes the whole line in one read.
///
/// # Examples
///
/// ```rust
/// use skt_core::encode_line;
///
/// assert_eq!(encode_line("hello"), b"hello\n");
/// assert_eq!(encode_line("hello\r\n"), b"hello\n");
/// ```
pub fn encode_line(text: &str) -> Vec<u8> {
    let body = text.trim_end_matches(&['\n', '\r'][..]);

    // Reserve one byte for the newline terminator.
    let limit = MAX_PAYLOAD - 1;
    let mut end = body.len().min(limit);
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    let mut line = Vec::with_capacity(end + 1);
    line.extend_from_slice(&body.as_bytes()[..end]);
    line.push(b'\n');
    line
}

/// Decodes one [`Reply`] from the beginning of `bytes`.
///
/// Returns the reply and the number of bytes consumed (the line including its
/// terminator), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError::Incomplete`] when no newline has arrived yet, and
/// [`ProtocolError::UnrecognizedReply`] for a complete line that is neither
/// `Connect OK` nor `ACK`.
///
/// # Examples
///
/// ```rust
/// use skt_core::{decode_reply, Reply};
///
/// let (reply, consumed) = decode_reply(b"Connect OK\nACK\n").unwrap();
/// assert_eq!(reply, Reply::Greeting);
/// assert_eq!(consumed, 11);
/// ```
pub fn decode_reply(bytes: &[u8]) -> Result<(Reply, usize), ProtocolError> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(ProtocolError::Incomplete {
            available: bytes.len(),
        })?;
    let line = &bytes[..=newline];

    let reply = if line == GREETING_LINE.as_bytes() {
        Reply::Greeting
    } else if line == ACK_LINE.as_bytes() {
        Reply::Ack
    } else {
        let text = String::from_utf8_lossy(&line[..newline]).into_owned();
        return Err(ProtocolError::UnrecognizedReply(text));
    };

    Ok((reply, newline + 1))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
