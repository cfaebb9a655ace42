//! Integration tests: a real client session against a loopback stand-in
//! server that answers the way skt-server does.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use skt_client::application::ClientSession;
use skt_client::infrastructure::connect;
use skt_core::Reply;

/// Accepts one connection and answers each read with `Connect OK` (first)
/// or `ACK`.  Returns everything it received once the client closes.
async fn spawn_acknowledging_server() -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut greeted = false;
        let mut buf = [0u8; 255];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                return received;
            }
            received.extend_from_slice(&buf[..n]);
            let reply = Reply::for_message(greeted);
            greeted = true;
            stream.write_all(reply.as_bytes()).await.unwrap();
        }
    });
    (port, handle)
}

#[tokio::test]
async fn test_repeat_session_sends_count_messages() {
    // Arrange
    let (port, server) = spawn_acknowledging_server().await;
    let stream = connect("127.0.0.1", port).await.unwrap();
    let mut session = ClientSession::new(stream).with_await_reply(true);

    // Act
    let sent = session
        .run_repeat("ping", Duration::from_millis(10), Some(3))
        .await
        .unwrap();
    session.close().await.unwrap();

    // Assert
    assert_eq!(sent, 3);
    assert_eq!(server.await.unwrap(), b"ping\nping\nping\n");
}

#[tokio::test]
async fn test_awaited_replies_follow_greeting_then_ack() {
    let (port, server) = spawn_acknowledging_server().await;
    let stream = connect("localhost", port).await.unwrap();
    let mut session = ClientSession::new(stream).with_await_reply(true);

    let first = session.send("hello").await.unwrap();
    let second = session.send("world").await.unwrap();
    session.close().await.unwrap();

    assert_eq!(first.reply, Some(Reply::Greeting));
    assert_eq!(second.reply, Some(Reply::Ack));
    assert_eq!(server.await.unwrap(), b"hello\nworld\n");
}

#[tokio::test]
async fn test_interactive_session_sends_lines_until_quit() {
    let (port, server) = spawn_acknowledging_server().await;
    let stream = connect("127.0.0.1", port).await.unwrap();
    let mut session = ClientSession::new(stream).with_await_reply(true);
    let input: &[u8] = b"status\nreset\nquit\n";

    let sent = session
        .run_interactive(input, tokio::io::sink())
        .await
        .unwrap();
    session.close().await.unwrap();

    assert_eq!(sent, 2);
    assert_eq!(server.await.unwrap(), b"status\nreset\n");
}
