//! The descriptor identity shared by every server layer.
//!
//! A connection is identified solely by the OS descriptor number it was
//! issued.  Wrapping the raw integer in a newtype keeps descriptor values from
//! being mixed up with counts or ports, and gives them a stable, ordered,
//! hashable identity for the registry and the readiness snapshot.

use std::fmt;
use std::os::fd::{AsRawFd, RawFd};

/// An OS file descriptor number.
///
/// Ordering follows the numeric value, which is the order in which ready
/// descriptors are serviced within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Descriptor(RawFd);

impl Descriptor {
    /// Wraps a raw descriptor number.
    pub const fn new(raw: RawFd) -> Self {
        Self(raw)
    }

    /// Reads the descriptor number of any OS handle.
    pub fn of(handle: &impl AsRawFd) -> Self {
        Self(handle.as_raw_fd())
    }

    /// Returns the raw descriptor number.
    pub const fn raw(self) -> RawFd {
        self.0
    }
}

impl fmt::Display for Descriptor {
    /// Formats as `fd7`, the form used throughout the server's log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd{}", self.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
