//! Application layer: the send loops, independent of the concrete stream.

pub mod session;

pub use session::{is_quit, ClientError, ClientSession, SendReport, PROMPT};
