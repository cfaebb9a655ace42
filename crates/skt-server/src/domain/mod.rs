//! Domain layer for skt-server.
//!
//! Pure types with no I/O: the descriptor identity, the connection registry
//! with its readiness snapshot, and the server configuration.
//!
//! # What does NOT belong here?
//!
//! - Any `mio`, `socket2` or `std::net` stream types
//! - File reads or environment variable lookups
//! - Logging of runtime events (the driver does that)

pub mod config;
pub mod descriptor;
pub mod registry;

pub use config::{parse_bind_address, AddressError, ServerConfig};
pub use descriptor::Descriptor;
pub use registry::{ConnectionRegistry, ReadinessSnapshot};
