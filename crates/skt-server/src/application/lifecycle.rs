//! Connection lifecycle driver: the server's single-threaded event loop.
//!
//! # How one cycle works (for beginners)
//!
//! ```text
//! snapshot = registry.snapshot()          listener + every open connection
//! readiness = mux.wait_readable(snapshot, timeout)
//!   Timeout  -> nothing to do, next cycle
//!   Ready    -> for each ready fd, ascending:
//!                 fd == listener  -> accept, watch, register
//!                 otherwise       -> read up to 255 bytes
//!                                      data   -> handler, reply, keep
//!                                      closed -> evict
//!                                      error  -> evict
//! ```
//!
//! The first message on a connection is answered with `Connect OK\n`, every
//! later one with `ACK\n`.  The greeting travels the same readiness path as
//! every other message, so a slow client never stalls the loop.
//!
//! # Eviction
//!
//! A connection is evicted when its peer closes, when a read fails, or when
//! a reply cannot be written in full.  Eviction unwatches the descriptor,
//! removes it from the registry and closes it, in that order.  Other
//! connections are never affected.
//!
//! # Fatal errors
//!
//! Only a failure of the readiness wait itself ends the loop.  Accept
//! failures are logged and the loop carries on.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use skt_core::{inbound_text, Reply, MAX_PAYLOAD, READ_BUFFER_SIZE};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::application::command::{CommandHandler, NoopCommandHandler};
use crate::application::multiplexer::{MultiplexError, Multiplexer, WaitOutcome};
use crate::application::transport::{ConnectionSource, ReadOutcome, Transport};
use crate::domain::{ConnectionRegistry, Descriptor};

/// Errors that stop the event loop.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The listener could not be added to the watched set.
    #[error("failed to watch listener: {0}")]
    WatchListener(#[source] MultiplexError),

    /// The readiness wait failed.
    #[error(transparent)]
    Multiplexer(#[from] MultiplexError),
}

/// Running totals since the driver was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriverStats {
    pub accepted: u64,
    pub evicted: u64,
    pub messages: u64,
}

/// What happened during one call to [`ConnectionDriver::poll_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: WaitOutcome,
    /// Descriptors reported readable.
    pub ready: usize,
    pub accepted: usize,
    /// Messages answered.
    pub messages: usize,
    pub evicted: usize,
}

impl CycleReport {
    fn new(outcome: WaitOutcome, ready: usize) -> Self {
        Self {
            outcome,
            ready,
            accepted: 0,
            messages: 0,
            evicted: 0,
        }
    }
}

/// Why a connection was evicted.  Only used for logging.
enum EvictReason {
    PeerClosed,
    ReadFailed(io::Error),
    WriteFailed(io::Error),
}

impl fmt::Display for EvictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictReason::PeerClosed => f.write_str("peer closed"),
            EvictReason::ReadFailed(e) => write!(f, "read failed: {e}"),
            EvictReason::WriteFailed(e) => write!(f, "write failed: {e}"),
        }
    }
}

struct Connection {
    transport: Box<dyn Transport>,
    peer: Option<SocketAddr>,
    greeted: bool,
}

/// Owns the listener, every open connection and the multiplexer.
pub struct ConnectionDriver {
    source: Box<dyn ConnectionSource>,
    multiplexer: Box<dyn Multiplexer>,
    handler: Box<dyn CommandHandler>,
    registry: ConnectionRegistry,
    connections: HashMap<Descriptor, Connection>,
    poll_timeout: Duration,
    stats: DriverStats,
    closed: bool,
}

impl ConnectionDriver {
    /// Creates a driver and starts watching the listener.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::WatchListener`] if the multiplexer refuses the
    /// listener descriptor.
    pub fn new(
        source: Box<dyn ConnectionSource>,
        mut multiplexer: Box<dyn Multiplexer>,
        poll_timeout: Duration,
    ) -> Result<Self, DriverError> {
        let listener = source.descriptor();
        multiplexer
            .watch(listener)
            .map_err(DriverError::WatchListener)?;
        Ok(Self {
            source,
            multiplexer,
            handler: Box::new(NoopCommandHandler),
            registry: ConnectionRegistry::new(listener),
            connections: HashMap::new(),
            poll_timeout,
            stats: DriverStats::default(),
            closed: false,
        })
    }

    /// Replaces the command handler.
    pub fn with_command_handler(mut self, handler: Box<dyn CommandHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Runs cycles until `running` is cleared, then closes everything.
    ///
    /// # Errors
    ///
    /// Returns the first fatal multiplexer error.  Sockets are then released
    /// when the driver is dropped.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), DriverError> {
        info!(
            listener = %self.registry.listener(),
            timeout_secs = self.poll_timeout.as_secs_f64(),
            "event loop started"
        );
        while running.load(Ordering::SeqCst) {
            self.poll_once()?;
        }
        info!(
            accepted = self.stats.accepted,
            evicted = self.stats.evicted,
            messages = self.stats.messages,
            "event loop stopping"
        );
        self.shutdown();
        Ok(())
    }

    /// Performs exactly one wait cycle and services whatever became ready.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Multiplexer`] if the wait primitive fails.
    pub fn poll_once(&mut self) -> Result<CycleReport, DriverError> {
        let snapshot = self.registry.snapshot();
        let readiness = self
            .multiplexer
            .wait_readable(&snapshot, self.poll_timeout)?;

        let mut report = CycleReport::new(readiness.outcome, readiness.ready.len());
        if readiness.outcome == WaitOutcome::Timeout {
            trace!(watched = snapshot.len(), "wait timed out");
            return Ok(report);
        }

        let listener = self.registry.listener();
        for descriptor in readiness.ready {
            if descriptor == listener {
                self.accept_one(&mut report);
            } else {
                self.service(descriptor, &mut report);
            }
        }
        Ok(report)
    }

    /// Closes every connection and the listener.  Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        for descriptor in self.registry.drain() {
            self.multiplexer.unwatch(descriptor);
            if let Some(mut connection) = self.connections.remove(&descriptor) {
                connection.transport.close();
            }
        }
        self.multiplexer.unwatch(self.registry.listener());
        self.source.close();
        self.closed = true;
        info!("all connections closed");
    }

    fn accept_one(&mut self, report: &mut CycleReport) {
        let accepted = match self.source.accept() {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("{e}");
                return;
            }
        };

        let descriptor = accepted.descriptor;
        let mut transport = accepted.transport;
        if let Err(e) = self.multiplexer.watch(descriptor) {
            error!("dropping new connection: {e}");
            transport.close();
            return;
        }
        if !self.registry.insert(descriptor) {
            // A stale entry means a close happened behind the driver's back.
            warn!(%descriptor, "descriptor already tracked, replacing stale entry");
            if let Some(mut stale) = self.connections.remove(&descriptor) {
                stale.transport.close();
            }
        }
        self.connections.insert(
            descriptor,
            Connection {
                transport,
                peer: accepted.peer,
                greeted: false,
            },
        );

        self.stats.accepted += 1;
        report.accepted += 1;
        match accepted.peer {
            Some(peer) => info!(
                %descriptor,
                %peer,
                connections = self.registry.connection_count(),
                "accepted new connection"
            ),
            None => info!(
                %descriptor,
                connections = self.registry.connection_count(),
                "accepted new connection"
            ),
        }
    }

    fn service(&mut self, descriptor: Descriptor, report: &mut CycleReport) {
        let Some(connection) = self.connections.get_mut(&descriptor) else {
            debug!(%descriptor, "readiness for untracked descriptor ignored");
            return;
        };

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let eviction = match connection.transport.read(&mut buf[..MAX_PAYLOAD]) {
            ReadOutcome::Data(n) => {
                let text = inbound_text(&buf[..n]);
                info!(%descriptor, bytes = n, "received: {}", text.trim_end());
                self.handler.on_message(descriptor, &text);

                let reply = Reply::for_message(connection.greeted);
                match write_all(connection.transport.as_mut(), reply.as_bytes()) {
                    Ok(()) => {
                        connection.greeted = true;
                        self.stats.messages += 1;
                        report.messages += 1;
                        debug!(%descriptor, %reply, "reply sent");
                        None
                    }
                    Err(e) => Some(EvictReason::WriteFailed(e)),
                }
            }
            ReadOutcome::Closed => Some(EvictReason::PeerClosed),
            ReadOutcome::WouldBlock => {
                trace!(%descriptor, "spurious readiness");
                None
            }
            ReadOutcome::Failed(e) => Some(EvictReason::ReadFailed(e)),
        };

        if let Some(reason) = eviction {
            self.evict(descriptor, reason);
            report.evicted += 1;
        }
    }

    fn evict(&mut self, descriptor: Descriptor, reason: EvictReason) {
        self.multiplexer.unwatch(descriptor);
        self.registry.remove(descriptor);
        let peer = self
            .connections
            .remove(&descriptor)
            .and_then(|mut connection| {
                connection.transport.close();
                connection.peer
            });
        self.stats.evicted += 1;

        let connections = self.registry.connection_count();
        match (&reason, peer) {
            (EvictReason::PeerClosed, Some(peer)) => {
                info!(%descriptor, %peer, connections, "lost connection")
            }
            (EvictReason::PeerClosed, None) => {
                info!(%descriptor, connections, "lost connection")
            }
            (_, Some(peer)) => {
                warn!(%descriptor, %peer, connections, "evicting connection: {reason}")
            }
            (_, None) => warn!(%descriptor, connections, "evicting connection: {reason}"),
        }
    }
}

/// Writes the whole reply, retrying partial writes.  A connection that
/// cannot take a few bytes right away is treated as failed.
fn write_all(transport: &mut dyn Transport, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        match transport.write(bytes) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection accepted no reply bytes",
                ))
            }
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
