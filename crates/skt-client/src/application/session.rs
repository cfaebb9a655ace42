//! Client session: sends messages over one established connection.
//!
//! The session is generic over the stream so it can run against a real
//! `tokio::net::TcpStream` or against an in-memory mock in tests.
//!
//! # Replies
//!
//! The server answers every message with `Connect OK` (first) or `ACK`.  By
//! default the client does not read them, like a fire-and-forget sender; the
//! kernel simply buffers the replies.  With `await_reply` the session reads
//! until one full reply line has arrived and returns it.

use std::io;
use std::time::Duration;

use skt_core::{decode_reply, encode_line, MessageCounter, ProtocolError, Reply, READ_BUFFER_SIZE};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Prompt written before each line in interactive mode.
pub const PROMPT: &str = "Please enter the message (quit to exit): ";

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The host name could not be resolved.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The TCP connection could not be established.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Writing a message failed.
    #[error("failed to write to server: {0}")]
    Write(#[source] io::Error),

    /// Reading a reply failed.
    #[error("failed to read from server: {0}")]
    Read(#[source] io::Error),

    /// The server closed the connection while a reply was expected.
    #[error("server closed the connection")]
    ServerClosed,

    /// The server sent something other than a known reply line.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading the user's input failed.
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),
}

/// The outcome of one [`ClientSession::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Running number of this message, starting at 1.
    pub count: u64,
    /// Bytes written, newline included.
    pub bytes: usize,
    /// The decoded reply, when replies are awaited.
    pub reply: Option<Reply>,
}

/// Whether an interactive line ends the session.  Only the first four
/// characters are compared, so `quit`, `quitting` and `quit now` all match.
pub fn is_quit(line: &str) -> bool {
    line.starts_with("quit")
}

/// One connection to the server.
pub struct ClientSession<S> {
    stream: S,
    await_reply: bool,
    counter: MessageCounter,
    pending: Vec<u8>,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            await_reply: false,
            counter: MessageCounter::new(),
            pending: Vec::new(),
        }
    }

    /// Reads and decodes the server's reply after every send.
    pub fn with_await_reply(mut self, await_reply: bool) -> Self {
        self.await_reply = await_reply;
        self
    }

    /// Messages sent so far.
    pub fn sent(&self) -> u64 {
        self.counter.current()
    }

    /// Sends `text` as one newline-terminated line of at most 255 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Write`] if the write fails, and any read or
    /// decode error when replies are awaited.
    pub async fn send(&mut self, text: &str) -> Result<SendReport, ClientError> {
        let line = encode_line(text);
        self.stream
            .write_all(&line)
            .await
            .map_err(ClientError::Write)?;
        self.stream.flush().await.map_err(ClientError::Write)?;
        let count = self.counter.next();

        let reply = if self.await_reply {
            Some(self.read_reply().await?)
        } else {
            None
        };

        Ok(SendReport {
            count,
            bytes: line.len(),
            reply,
        })
    }

    async fn read_reply(&mut self) -> Result<Reply, ClientError> {
        loop {
            match decode_reply(&self.pending) {
                Ok((reply, consumed)) => {
                    self.pending.drain(..consumed);
                    return Ok(reply);
                }
                Err(ProtocolError::Incomplete { available }) => {
                    debug!(available, "waiting for the rest of the reply");
                }
                Err(e) => return Err(e.into()),
            }

            let mut buf = [0u8; READ_BUFFER_SIZE];
            let n = self.stream.read(&mut buf).await.map_err(ClientError::Read)?;
            if n == 0 {
                return Err(ClientError::ServerClosed);
            }
            self.pending.extend_from_slice(&buf[..n]);
        }
    }

    /// Sends `message` every `interval`, the first one immediately.
    ///
    /// Returns the number of messages sent once `limit` is reached.  Without a
    /// limit the loop only ends on error; callers race it against a shutdown
    /// signal.
    ///
    /// # Errors
    ///
    /// Returns the first [`ClientError`] from [`send`](Self::send).
    pub async fn run_repeat(
        &mut self,
        message: &str,
        interval: Duration,
        limit: Option<u64>,
    ) -> Result<u64, ClientError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while limit.map_or(true, |limit| self.sent() < limit) {
            ticker.tick().await;
            let report = self.send(message).await?;
            info!(count = report.count, bytes = report.bytes, "sent {message:?}");
            if let Some(reply) = report.reply {
                info!(%reply, "server replied");
            }
        }
        Ok(self.sent())
    }

    /// Sends every line read from `input` until `quit` or end of input,
    /// writing [`PROMPT`] to `prompt` before each line.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Input`] if reading input or writing the prompt
    /// fails, or the first error from [`send`](Self::send).
    pub async fn run_interactive<R, W>(&mut self, input: R, mut prompt: W) -> Result<u64, ClientError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            prompt
                .write_all(PROMPT.as_bytes())
                .await
                .map_err(ClientError::Input)?;
            prompt.flush().await.map_err(ClientError::Input)?;

            let Some(line) = lines.next_line().await.map_err(ClientError::Input)? else {
                info!("end of input");
                break;
            };
            if is_quit(&line) {
                break;
            }

            let report = self.send(&line).await?;
            info!(count = report.count, bytes = report.bytes, "sent {line:?}");
            if let Some(reply) = report.reply {
                info!(%reply, "server replied");
            }
        }
        Ok(self.sent())
    }

    /// Shuts down the write half so the server sees an orderly close.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Write`] if the shutdown fails.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await.map_err(ClientError::Write)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
