//! skt-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! - `domain`: client configuration and send modes
//! - `application`: [`application::ClientSession`], generic over any async
//!   stream
//! - `infrastructure`: name resolution and TCP connect

pub mod application;
pub mod domain;
pub mod infrastructure;
