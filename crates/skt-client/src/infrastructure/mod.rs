//! Infrastructure layer: OS networking for the client.

pub mod network;

pub use network::connect;
