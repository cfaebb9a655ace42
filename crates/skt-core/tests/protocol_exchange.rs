//! Integration tests for the skt-core message exchange protocol.
//!
//! These tests walk through a whole client/server conversation using only the
//! public API: the client encodes lines, the server side picks replies, and
//! the client decodes a stream of replies that arrived coalesced.

use skt_core::{decode_reply, encode_line, inbound_text, ProtocolError, Reply, MAX_PAYLOAD};

/// Simulates the server side of one read: the chunk a read would observe and
/// the reply that answers it.
fn serve(chunk: &[u8], greeted: &mut bool) -> (String, Reply) {
    let observed = &chunk[..chunk.len().min(MAX_PAYLOAD)];
    let reply = Reply::for_message(*greeted);
    *greeted = true;
    (inbound_text(observed).into_owned(), reply)
}

#[test]
fn test_conversation_greets_once_then_acknowledges() {
    // Arrange
    let mut greeted = false;
    let mut wire = Vec::new();

    // Act: three messages from the same connection
    for text in ["hello", "world", "again"] {
        let (observed, reply) = serve(&encode_line(text), &mut greeted);
        assert_eq!(observed.trim_end(), text);
        wire.extend_from_slice(reply.as_bytes());
    }

    // Assert: the client decodes the coalesced reply stream in order
    let mut cursor = 0;
    let mut replies = Vec::new();
    while cursor < wire.len() {
        let (reply, consumed) = decode_reply(&wire[cursor..]).expect("valid reply");
        replies.push(reply);
        cursor += consumed;
    }
    assert_eq!(replies, vec![Reply::Greeting, Reply::Ack, Reply::Ack]);
}

#[test]
fn test_full_length_line_is_observed_in_one_read() {
    // Arrange: a line that exactly fills one read
    let text = "z".repeat(MAX_PAYLOAD - 1);
    let line = encode_line(&text);
    assert_eq!(line.len(), MAX_PAYLOAD);

    // Act
    let mut greeted = false;
    let (observed, _) = serve(&line, &mut greeted);

    // Assert
    assert_eq!(observed.len(), MAX_PAYLOAD);
}

#[test]
fn test_oversized_raw_chunk_is_truncated_not_rejected() {
    let chunk = vec![b'q'; 300];
    let mut greeted = false;
    let (observed, reply) = serve(&chunk, &mut greeted);
    assert_eq!(observed.len(), MAX_PAYLOAD);
    assert_eq!(reply, Reply::Greeting);
}

#[test]
fn test_partial_reply_reports_incomplete() {
    let result = decode_reply(b"AC");
    assert_eq!(result, Err(ProtocolError::Incomplete { available: 2 }));
}
