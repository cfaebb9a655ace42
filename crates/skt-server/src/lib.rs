//! skt-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! - `domain`: descriptors, the connection registry, server configuration
//! - `application`: the connection lifecycle driver and its capability traits
//! - `infrastructure`: sockets, the `mio` multiplexer, TCP transport, config
//!   file and the [`infrastructure::Server`] that wires them together
//!
//! The server relies on Unix descriptor semantics and builds on Unix-like
//! targets only.

pub mod application;
pub mod domain;
pub mod infrastructure;
