//! # skt-core
//!
//! Shared library for the skt multi-connection TCP server and its client,
//! containing the message exchange protocol: buffer limits, the fixed reply
//! vocabulary, outbound line encoding and reply decoding.
//!
//! This crate is used by both the server and client applications.
//! It has zero dependencies on OS APIs or network sockets.
//!
//! # Protocol overview (for beginners)
//!
//! The protocol is deliberately tiny.  There is no framing: whatever bytes a
//! single socket read returns are treated as one message, up to a maximum of
//! 255 bytes.  The server answers every message with a fixed line of text:
//!
//! ```text
//! client                          server
//! ──────                          ──────
//! "hello\n"              ──►
//!                        ◄──      "Connect OK\n"   (first message only)
//! "world\n"              ──►
//!                        ◄──      "ACK\n"          (every later message)
//! ```
//!
//! - **`protocol::messages`** – Constants and the [`Reply`] vocabulary.
//! - **`protocol::codec`** – Encoding outbound lines and decoding replies.
//! - **`protocol::sequence`** – A counter for numbering sent messages.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `skt_core::Reply` instead of `skt_core::protocol::messages::Reply`.
pub use protocol::codec::{decode_reply, encode_line, ProtocolError};
pub use protocol::messages::{inbound_text, Reply, MAX_PAYLOAD, READ_BUFFER_SIZE};
pub use protocol::sequence::MessageCounter;
