//! Command handler capability.
//!
//! After every successful read the driver passes the received text to a
//! [`CommandHandler`].  The call is fire-and-forget: nothing the handler does
//! changes which reply is written or whether the connection stays open.

use crate::domain::Descriptor;

/// Receives the text of every message the server reads.
#[cfg_attr(test, mockall::automock)]
pub trait CommandHandler: Send {
    /// Called once per successful read, before the reply is written.
    fn on_message(&mut self, descriptor: Descriptor, text: &str);
}

/// The default handler: ignores every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCommandHandler;

impl CommandHandler for NoopCommandHandler {
    fn on_message(&mut self, _descriptor: Descriptor, _text: &str) {}
}
