//! Readiness multiplexer capability.
//!
//! One wait cycle takes the registry's [`ReadinessSnapshot`] and a timeout,
//! blocks until at least one watched descriptor is readable (or the timeout
//! expires), and reports the readable subset in ascending order.
//!
//! ```text
//! wait_readable(snapshot, timeout)
//!   ├─ Err(MultiplexError)         fatal: the primitive itself failed
//!   ├─ Ok(Timeout, {})             normal: loop again
//!   └─ Ok(Ready,   {fd, fd, ...})  service every one before waiting again
//! ```
//!
//! Registration is explicit: the driver calls [`Multiplexer::watch`] right
//! after an accept and [`Multiplexer::unwatch`] right before a close, so a
//! descriptor number reused by the OS is never confused with its previous
//! owner.

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{Descriptor, ReadinessSnapshot};

/// How a wait cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The timeout expired with nothing readable.
    Timeout,
    /// The wait returned early; the ready set may still be empty (a wake-up).
    Ready,
}

/// The result of one wait cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub outcome: WaitOutcome,
    /// Readable descriptors, ascending.  Always a subset of the snapshot.
    pub ready: BTreeSet<Descriptor>,
}

impl Readiness {
    /// A timeout with an empty ready set.
    pub fn timeout() -> Self {
        Self {
            outcome: WaitOutcome::Timeout,
            ready: BTreeSet::new(),
        }
    }

    /// An early return with the given readable descriptors.
    pub fn ready(ready: impl IntoIterator<Item = Descriptor>) -> Self {
        Self {
            outcome: WaitOutcome::Ready,
            ready: ready.into_iter().collect(),
        }
    }
}

/// Errors raised by the multiplexing primitive.
#[derive(Debug, Error)]
pub enum MultiplexError {
    /// The readiness facility could not be created.
    #[error("failed to create readiness facility: {0}")]
    Create(#[source] io::Error),

    /// A descriptor could not be added to the watched set.
    #[error("failed to watch {descriptor}: {source}")]
    Watch {
        descriptor: Descriptor,
        #[source]
        source: io::Error,
    },

    /// The wait itself failed.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),
}

/// A readiness-notification mechanism.
pub trait Multiplexer: Send {
    /// Adds a descriptor to the watched set.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplexError::Watch`] if the OS refuses the registration.
    fn watch(&mut self, descriptor: Descriptor) -> Result<(), MultiplexError>;

    /// Removes a descriptor from the watched set.  Must be called while the
    /// descriptor is still open.  Unknown descriptors are ignored.
    fn unwatch(&mut self, descriptor: Descriptor);

    /// Waits up to `timeout` for any descriptor in `snapshot` to be readable.
    ///
    /// A descriptor that is still readable after being serviced must be
    /// reported again by the next call (level-triggered semantics).
    ///
    /// # Errors
    ///
    /// Returns [`MultiplexError::Wait`] if the wait primitive fails.  An
    /// interrupted wait is reported as [`WaitOutcome::Timeout`] instead.
    fn wait_readable(
        &mut self,
        snapshot: &ReadinessSnapshot,
        timeout: Duration,
    ) -> Result<Readiness, MultiplexError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_has_empty_ready_set() {
        let r = Readiness::timeout();
        assert_eq!(r.outcome, WaitOutcome::Timeout);
        assert!(r.ready.is_empty());
    }

    #[test]
    fn test_ready_sorts_descriptors_ascending() {
        let r = Readiness::ready([Descriptor::new(8), Descriptor::new(3), Descriptor::new(5)]);
        let order: Vec<_> = r.ready.into_iter().map(Descriptor::raw).collect();
        assert_eq!(order, vec![3, 5, 8]);
    }

    #[test]
    fn test_watch_error_message_names_descriptor() {
        let err = MultiplexError::Watch {
            descriptor: Descriptor::new(4),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("failed to watch fd4"));
    }
}
