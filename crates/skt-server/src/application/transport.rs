//! Transport capability: how the driver talks to the listener and to each
//! accepted connection.
//!
//! The driver never touches sockets directly.  It accepts through a
//! [`ConnectionSource`] and reads/writes through one boxed [`Transport`] per
//! connection.  The infrastructure layer provides the plaintext TCP
//! implementation; an encrypted transport can be substituted at
//! configuration time as long as it keeps the same contract:
//!
//! - the connection is already non-blocking when it is handed over;
//! - `read` distinguishes data, orderly close, "nothing yet" and failure;
//! - `close` is idempotent.

use std::io;
use std::net::{SocketAddr, TcpStream};

use thiserror::Error;

use crate::domain::Descriptor;

/// Result of one read attempt on a connection.
#[derive(Debug)]
pub enum ReadOutcome {
    /// `n > 0` bytes were placed at the start of the buffer.
    Data(usize),
    /// The peer performed an orderly shutdown (zero-length read).
    Closed,
    /// Nothing to read right now; the readiness report was spurious.
    WouldBlock,
    /// A genuine I/O error.
    Failed(io::Error),
}

impl ReadOutcome {
    /// Classifies the raw result of a `read(2)`-style call.
    pub fn from_io(result: io::Result<usize>) -> Self {
        match result {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => ReadOutcome::Data(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => ReadOutcome::WouldBlock,
            Err(e) => ReadOutcome::Failed(e),
        }
    }
}

/// Per-connection byte transport.
pub trait Transport: Send {
    /// Reads at most `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> ReadOutcome;

    /// Writes some prefix of `bytes`, returning how many were written.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Releases the connection.  Calling it again does nothing.
    fn close(&mut self);
}

/// Wraps a freshly accepted, already non-blocking stream in a [`Transport`].
///
/// The plaintext factory is the default; an encrypting factory would run its
/// handshake here.
pub trait TransportFactory: Send {
    /// # Errors
    ///
    /// Returns [`AcceptError::Transport`] if the stream cannot be wrapped.
    /// The stream is dropped (and therefore closed) in that case.
    fn wrap(
        &self,
        descriptor: Descriptor,
        stream: TcpStream,
    ) -> Result<Box<dyn Transport>, AcceptError>;
}

/// A connection handed over by a successful accept.
pub struct AcceptedConnection {
    /// OS descriptor of the new connection.
    pub descriptor: Descriptor,
    /// Remote address, when the OS reported one.
    pub peer: Option<SocketAddr>,
    /// Transport already in non-blocking mode.
    pub transport: Box<dyn Transport>,
}

impl std::fmt::Debug for AcceptedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptedConnection")
            .field("descriptor", &self.descriptor)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

/// Why an accept produced no connection.  Never fatal.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// The OS accept call failed.
    #[error("accept failed: {0}")]
    Io(#[from] io::Error),

    /// The socket was accepted but the transport could not be set up on it.
    #[error("transport setup failed on {descriptor}: {reason}")]
    Transport {
        descriptor: Descriptor,
        reason: String,
    },
}

/// The listening side: produces new connections.
pub trait ConnectionSource: Send {
    /// Descriptor of the listener, watched in every readiness cycle.
    fn descriptor(&self) -> Descriptor;

    /// Accepts one pending connection.
    fn accept(&mut self) -> Result<AcceptedConnection, AcceptError>;

    /// Stops listening.  Calling it again does nothing.
    fn close(&mut self);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
