//! Application layer: the event loop and the capability traits it drives.
//!
//! This layer depends on `domain` and on `skt-core`, never on
//! `infrastructure`.  Concrete sockets and the OS readiness facility are
//! injected through the traits below.
//!
//! - [`multiplexer`]: wait for readable descriptors
//! - [`transport`]: accept, read, write and close connections
//! - [`command`]: observe every received message
//! - [`lifecycle`]: the [`ConnectionDriver`] tying them together

pub mod command;
pub mod lifecycle;
pub mod multiplexer;
pub mod transport;

#[cfg(test)]
pub(crate) mod fakes;

pub use command::{CommandHandler, NoopCommandHandler};
pub use lifecycle::{ConnectionDriver, CycleReport, DriverError, DriverStats};
pub use multiplexer::{MultiplexError, Multiplexer, Readiness, WaitOutcome};
pub use transport::{
    AcceptError, AcceptedConnection, ConnectionSource, ReadOutcome, Transport, TransportFactory,
};
