//! Infrastructure layer: OS-facing implementations of the application
//! traits.
//!
//! - [`socket`]: listener creation, accept, blocking-mode toggle (`socket2`)
//! - [`poller`]: the `mio` readiness multiplexer and the shutdown handle
//! - [`tcp`]: plaintext listener source and per-connection transport
//! - [`config_file`]: optional TOML configuration
//! - [`server`]: wires everything into a runnable [`Server`]

pub mod config_file;
pub mod poller;
pub mod server;
pub mod socket;
pub mod tcp;

pub use config_file::{load_config, parse_config, ConfigError, FileConfig};
pub use poller::{MioMultiplexer, ShutdownHandle};
pub use server::{Server, StartupError};
pub use socket::SocketError;
pub use tcp::{PlainTransport, PlainTransportFactory, TcpConnectionSource};
