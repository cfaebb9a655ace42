//! Domain layer: client configuration.  No I/O.

pub mod config;

pub use config::{ClientConfig, SendMode, DEFAULT_INTERVAL, DEFAULT_MESSAGE};
