//! Client configuration.
//!
//! The client runs in one of two modes:
//!
//! - **Repeat**: send the same message every `interval` until stopped (or
//!   until `limit` messages have gone out).
//! - **Interactive**: send each line typed on stdin; `quit` or end of input
//!   stops the session.

use std::time::Duration;

/// Time between messages in repeat mode.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Message sent in repeat mode when none is given.
pub const DEFAULT_MESSAGE: &str = "hello";

/// What the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMode {
    Repeat {
        message: String,
        interval: Duration,
        /// Stop after this many messages; `None` runs until interrupted.
        limit: Option<u64>,
    },
    Interactive,
}

/// All runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or IP address of the server.
    pub host: String,
    pub port: u16,
    pub mode: SendMode,
    /// Read and decode the server's reply after every send.
    pub await_reply: bool,
}

impl ClientConfig {
    /// Repeat mode with the default message and interval, replies ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skt_client::domain::{ClientConfig, SendMode};
    ///
    /// let cfg = ClientConfig::new("localhost", 4549);
    /// assert!(matches!(cfg.mode, SendMode::Repeat { limit: None, .. }));
    /// assert!(!cfg.await_reply);
    /// ```
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            mode: SendMode::Repeat {
                message: DEFAULT_MESSAGE.to_string(),
                interval: DEFAULT_INTERVAL,
                limit: None,
            },
            await_reply: false,
        }
    }

    /// `host:port`, used in log lines and errors.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
