//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for the listener and event
//! loop settings.  It is built once at startup from CLI arguments and an
//! optional TOML file (see `infrastructure::config_file`), then handed to the
//! infrastructure layer that opens the listener.
//!
//! # Bind address validation
//!
//! The optional bind address is first checked by length (8 to 16 characters)
//! and then parsed as IPv4.  Anything that fails either check is reported as
//! an [`AddressError`]; the caller logs a warning and binds to every
//! interface instead.  A bad address is never fatal.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;

/// Pending-connection queue length passed to `listen()`.
pub const DEFAULT_BACKLOG: u32 = 64;

/// Upper bound on how long one readiness wait may block.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Shortest bind address string accepted (`"10.0.0.1"`).
pub const MIN_ADDRESS_LEN: usize = 8;

/// Longest bind address string accepted.
pub const MAX_ADDRESS_LEN: usize = 16;

/// Reasons a bind address string is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    /// The string is shorter than 8 or longer than 16 characters.
    #[error("invalid address {address:?}: length {len} is outside 8..=16")]
    InvalidLength { address: String, len: usize },

    /// The string has a plausible length but is not dotted-quad IPv4.
    #[error("invalid address {0:?}: not an IPv4 address")]
    Malformed(String),
}

/// Validates a bind address string.
///
/// # Errors
///
/// Returns [`AddressError::InvalidLength`] when the length check fails and
/// [`AddressError::Malformed`] when the string does not parse as IPv4.
///
/// # Examples
///
/// ```rust
/// use skt_server::domain::config::parse_bind_address;
///
/// assert!(parse_bind_address("192.168.0.4").is_ok());
/// assert!(parse_bind_address("1.2.3.4").is_err()); // only 7 characters
/// ```
pub fn parse_bind_address(raw: &str) -> Result<Ipv4Addr, AddressError> {
    let len = raw.len();
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
        return Err(AddressError::InvalidLength {
            address: raw.to_string(),
            len,
        });
    }
    raw.parse()
        .map_err(|_| AddressError::Malformed(raw.to_string()))
}

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use skt_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::new(4549);
/// assert_eq!(cfg.listen_addr().to_string(), "0.0.0.0:4549");
/// assert_eq!(cfg.poll_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// TCP port to listen on.  Port 0 asks the OS for a free port.
    pub port: u16,

    /// Interface to bind to; `None` binds every interface.
    pub bind_address: Option<Ipv4Addr>,

    /// Length of the pending-connection queue.
    pub backlog: u32,

    /// Upper bound on one readiness wait.
    pub poll_timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration for `port` with every other setting at its
    /// default: any address, backlog 64, 5 second wait timeout.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            bind_address: None,
            backlog: DEFAULT_BACKLOG,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Sets the interface to bind to.
    pub fn with_bind_address(mut self, address: Ipv4Addr) -> Self {
        self.bind_address = Some(address);
        self
    }

    /// Sets the readiness wait timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the listen backlog.
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// The socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        let ip = self.bind_address.unwrap_or(Ipv4Addr::UNSPECIFIED);
        SocketAddr::V4(SocketAddrV4::new(ip, self.port))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
