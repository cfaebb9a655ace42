//! Wiring: builds a ready-to-run [`Server`] from a [`ServerConfig`].
//!
//! ```text
//! ServerConfig ──► TcpConnectionSource (socket2 listener)
//!              ──► MioMultiplexer
//!              ──► ConnectionDriver ──► Server { run / poll_once }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::command::CommandHandler;
use crate::application::lifecycle::{ConnectionDriver, CycleReport, DriverError, DriverStats};
use crate::application::multiplexer::MultiplexError;
use crate::application::transport::{ConnectionSource, TransportFactory};
use crate::domain::ServerConfig;
use crate::infrastructure::poller::{MioMultiplexer, ShutdownHandle};
use crate::infrastructure::socket::SocketError;
use crate::infrastructure::tcp::TcpConnectionSource;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error(transparent)]
    Multiplexer(#[from] MultiplexError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// A bound listener plus the event loop that serves it.
pub struct Server {
    driver: ConnectionDriver,
    running: Arc<AtomicBool>,
    shutdown: ShutdownHandle,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the listener and prepares the event loop with the plaintext
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns a [`StartupError`] if the listener or the readiness facility
    /// cannot be set up.
    pub fn bind(config: &ServerConfig) -> Result<Self, StartupError> {
        Self::bind_with(config, None)
    }

    /// Like [`Server::bind`], with a custom transport for accepted streams.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub fn bind_with(
        config: &ServerConfig,
        factory: Option<Box<dyn TransportFactory>>,
    ) -> Result<Self, StartupError> {
        let mut source = TcpConnectionSource::bind(config)?;
        if let Some(factory) = factory {
            source = source.with_transport_factory(factory);
        }
        let local_addr = source.local_addr().map_err(StartupError::LocalAddr)?;
        let listener = source.descriptor();

        let multiplexer = MioMultiplexer::new()?;
        let running = Arc::new(AtomicBool::new(true));
        let shutdown = multiplexer.shutdown_handle(Arc::clone(&running));
        let driver =
            ConnectionDriver::new(Box::new(source), Box::new(multiplexer), config.poll_timeout)?;

        info!(%local_addr, %listener, backlog = config.backlog, "Server running on listener {listener}");
        Ok(Self {
            driver,
            running,
            shutdown,
            local_addr,
        })
    }

    /// Replaces the command handler that observes every message.
    pub fn with_command_handler(mut self, handler: Box<dyn CommandHandler>) -> Self {
        self.driver = self.driver.with_command_handler(handler);
        self
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops [`Server::run`] from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn driver(&self) -> &ConnectionDriver {
        &self.driver
    }

    /// Runs one wait cycle.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the readiness wait fails.
    pub fn poll_once(&mut self) -> Result<CycleReport, DriverError> {
        self.driver.poll_once()
    }

    /// Runs until the shutdown handle fires, then closes every connection.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the readiness wait fails.
    pub fn run(mut self) -> Result<DriverStats, DriverError> {
        self.driver.run(&self.running)?;
        Ok(self.driver.stats())
    }
}
