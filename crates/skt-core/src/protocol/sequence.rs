//! Thread-safe counter for numbering sent messages.
//!
//! The client logs a running count alongside every message it sends
//! (`"hello" wrote 6 count=3`).  The counter is atomic so that a Ctrl-C
//! handler or a metrics task can read it while the send loop is running,
//! without a `Mutex`.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing message counter.
///
/// Counting starts at 0; [`next`](Self::next) returns the count *after*
/// incrementing, so the first message is number 1.  The counter wraps at
/// `u64::MAX` without panicking.
///
/// # Examples
///
/// ```rust
/// use skt_core::MessageCounter;
///
/// let counter = MessageCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// assert_eq!(counter.current(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MessageCounter {
    inner: AtomicU64,
}

impl MessageCounter {
    /// Creates a new counter at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Records one more message and returns the new count.
    ///
    /// `Ordering::Relaxed` is enough: the count is only reported, never used
    /// to synchronise memory between threads.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the current count without incrementing.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
