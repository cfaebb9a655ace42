//! Plaintext TCP implementations of the transport capability.
//!
//! [`TcpConnectionSource`] owns the listener and hands every accepted stream
//! to a [`TransportFactory`]; the default [`PlainTransportFactory`] wraps it
//! in a [`PlainTransport`] that reads and writes the socket directly.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::debug;

use crate::application::transport::{
    AcceptError, AcceptedConnection, ConnectionSource, ReadOutcome, Transport, TransportFactory,
};
use crate::domain::{Descriptor, ServerConfig};
use crate::infrastructure::socket::{self, SocketError};

/// The listening socket plus the factory applied to each accepted stream.
pub struct TcpConnectionSource {
    listener: Option<TcpListener>,
    descriptor: Descriptor,
    factory: Box<dyn TransportFactory>,
}

impl TcpConnectionSource {
    /// Opens a listener for `config` with the plaintext transport.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the listener cannot be created, bound or
    /// put into listening mode.
    pub fn bind(config: &ServerConfig) -> Result<Self, SocketError> {
        let listener = socket::open_listener(config.listen_addr(), config.backlog)?;
        Ok(Self::from_listener(listener))
    }

    /// Wraps an existing listener.  The caller is responsible for having put
    /// it into listening mode.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self {
            descriptor: Descriptor::of(&listener),
            listener: Some(listener),
            factory: Box::new(PlainTransportFactory),
        }
    }

    /// Replaces the factory used for every accepted stream.
    pub fn with_transport_factory(mut self, factory: Box<dyn TransportFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// The address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` once the source is closed.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?
            .local_addr()
    }
}

impl ConnectionSource for TcpConnectionSource {
    fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    fn accept(&mut self) -> Result<AcceptedConnection, AcceptError> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        let (stream, peer) = socket::accept_connection(listener)?;
        let descriptor = Descriptor::of(&stream);
        let transport = self.factory.wrap(descriptor, stream)?;
        Ok(AcceptedConnection {
            descriptor,
            peer: Some(peer),
            transport,
        })
    }

    fn close(&mut self) {
        if self.listener.take().is_some() {
            debug!(listener = %self.descriptor, "listener closed");
        }
    }
}

/// Builds [`PlainTransport`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTransportFactory;

impl TransportFactory for PlainTransportFactory {
    fn wrap(
        &self,
        _descriptor: Descriptor,
        stream: TcpStream,
    ) -> Result<Box<dyn Transport>, AcceptError> {
        Ok(Box::new(PlainTransport::new(stream)))
    }
}

/// Reads and writes a TCP stream with no transformation.
#[derive(Debug)]
pub struct PlainTransport {
    stream: Option<TcpStream>,
}

impl PlainTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl Transport for PlainTransport {
    fn read(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let Some(stream) = self.stream.as_mut() else {
            return ReadOutcome::Failed(io::Error::from(io::ErrorKind::NotConnected));
        };
        loop {
            match stream.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return ReadOutcome::from_io(result),
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.write(bytes),
            None => Err(io::Error::from(io::ErrorKind::NotConnected)),
        }
    }

    fn close(&mut self) {
        // Dropping the stream closes the descriptor.
        self.stream = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
