//! Socket primitives: create/bind/listen, accept, and the blocking-mode
//! toggle.
//!
//! `std::net::TcpListener::bind` always listens with the platform's default
//! backlog, so the listener is built through `socket2` to pass the configured
//! queue length explicitly.
//!
//! # Accept contract
//!
//! ```text
//! listener ──set_blocking(true)──► accept() ──set_blocking(false)──► listener
//!                                     │
//!                                     └─► new stream ──set_blocking(false)
//! ```
//!
//! The listener only reaches `accept` after the multiplexer reported it
//! readable, so the blocking call returns at once.  The new stream leaves this
//! module already non-blocking.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::AsFd;

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while setting up the listener.  All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The OS refused to create a socket.
    #[error("failed to create socket: {0}")]
    Create(#[source] io::Error),

    /// A socket option could not be applied.
    #[error("failed to configure socket: {0}")]
    Configure(#[source] io::Error),

    /// The address is in use or not available on this host.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The socket could not be switched to listening mode.
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Creates a TCP listener bound to `addr` with the given backlog.
///
/// The returned listener is non-blocking and has `SO_REUSEADDR` set so a
/// restarted server can bind while old connections sit in `TIME_WAIT`.
///
/// # Errors
///
/// Returns a [`SocketError`] naming the step that failed.
pub fn open_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, SocketError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(SocketError::Create)?;
    socket
        .set_reuse_address(true)
        .map_err(SocketError::Configure)?;
    socket
        .bind(&addr.into())
        .map_err(|source| SocketError::Bind { addr, source })?;
    let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
    socket
        .listen(backlog)
        .map_err(|source| SocketError::Listen { addr, source })?;
    socket
        .set_nonblocking(true)
        .map_err(SocketError::Configure)?;
    debug!(%addr, backlog, "listener ready");
    Ok(socket.into())
}

/// Switches any socket between blocking and non-blocking mode.
///
/// # Errors
///
/// Returns the OS error from `fcntl`.
pub fn set_blocking(socket: impl AsFd, blocking: bool) -> io::Result<()> {
    SockRef::from(&socket).set_nonblocking(!blocking)
}

/// Accepts one pending connection and returns it in non-blocking mode.
///
/// # Errors
///
/// Returns the OS error if the accept fails or the new stream cannot be
/// switched to non-blocking mode.  A failed mode switch drops (closes) the
/// stream.
pub fn accept_connection(listener: &TcpListener) -> io::Result<(TcpStream, SocketAddr)> {
    set_blocking(listener, true)?;
    let accepted = listener.accept();
    if let Err(e) = set_blocking(listener, false) {
        warn!("failed to restore listener to non-blocking mode: {e}");
    }
    let (stream, peer) = accepted?;
    set_blocking(&stream, false)?;
    Ok((stream, peer))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
