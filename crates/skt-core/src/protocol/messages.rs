//! Message exchange protocol constants and the server reply vocabulary.
//!
//! Inbound messages are raw byte chunks.  Outbound messages are one of two
//! fixed lines, chosen by whether the connection has already been greeted.

use std::borrow::Cow;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the zero-initialised buffer a single read lands in.
pub const READ_BUFFER_SIZE: usize = 256;

/// Maximum number of payload bytes observed by a single read.
///
/// One byte of [`READ_BUFFER_SIZE`] is kept as the terminating zero, so a
/// longer message is truncated to this length for that read.
pub const MAX_PAYLOAD: usize = READ_BUFFER_SIZE - 1;

/// Reply sent for the first message received on a new connection.
pub const GREETING_LINE: &str = "Connect OK\n";

/// Reply sent for every message after the first.
pub const ACK_LINE: &str = "ACK\n";

// ── Replies ───────────────────────────────────────────────────────────────────

/// The fixed server replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `"Connect OK\n"`, answering the first message on a connection.
    Greeting,
    /// `"ACK\n"`, answering every later message.
    Ack,
}

impl Reply {
    /// Chooses the reply for a message, given whether the connection has
    /// already been greeted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use skt_core::Reply;
    ///
    /// assert_eq!(Reply::for_message(false), Reply::Greeting);
    /// assert_eq!(Reply::for_message(true), Reply::Ack);
    /// ```
    pub fn for_message(already_greeted: bool) -> Self {
        if already_greeted {
            Reply::Ack
        } else {
            Reply::Greeting
        }
    }

    /// Returns the exact line written on the wire, including the newline.
    pub fn as_str(self) -> &'static str {
        match self {
            Reply::Greeting => GREETING_LINE,
            Reply::Ack => ACK_LINE,
        }
    }

    /// Returns the wire bytes of this reply.
    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().trim_end())
    }
}

// ── Inbound text ──────────────────────────────────────────────────────────────

/// Interprets a received chunk as text.
///
/// The chunk is treated like a zero-terminated string: text stops at the
/// first NUL byte, and invalid UTF-8 is replaced rather than rejected.
/// Chunks longer than [`MAX_PAYLOAD`] are cut to that length.
pub fn inbound_text(chunk: &[u8]) -> Cow<'_, str> {
    let chunk = &chunk[..chunk.len().min(MAX_PAYLOAD)];
    let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
    String::from_utf8_lossy(&chunk[..end])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
