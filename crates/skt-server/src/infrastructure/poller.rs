//! `mio`-backed readiness multiplexer.
//!
//! mio registers descriptors edge-triggered: a readiness event is delivered
//! once per state change.  The driver expects level-triggered behaviour (a
//! descriptor with unread data is reported again next cycle), so every
//! descriptor reported ready is re-registered before the following wait.
//! Re-registration makes the OS re-evaluate readiness, which re-delivers the
//! event if data is still pending.
//!
//! Raw descriptors are registered through [`SourceFd`] with the descriptor
//! number as the token, so events map straight back to descriptors.  The
//! [`Waker`] uses `Token(usize::MAX)`, which no descriptor can collide with.

use std::collections::BTreeSet;
use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, trace, warn};

use crate::application::multiplexer::{MultiplexError, Multiplexer, Readiness, WaitOutcome};
use crate::domain::{Descriptor, ReadinessSnapshot};

const WAKE_TOKEN: Token = Token(usize::MAX);

/// Maximum events collected per wait.
const EVENT_CAPACITY: usize = 1024;

fn token_for(descriptor: Descriptor) -> Token {
    Token(descriptor.raw() as usize)
}

fn descriptor_for(token: Token) -> Descriptor {
    Descriptor::new(token.0 as RawFd)
}

/// A [`Multiplexer`] over the platform's native readiness facility.
pub struct MioMultiplexer {
    poll: Poll,
    events: Events,
    waker: Arc<Waker>,
    registered: BTreeSet<Descriptor>,
    rearm: Vec<Descriptor>,
}

impl MioMultiplexer {
    /// # Errors
    ///
    /// Returns [`MultiplexError::Create`] if the OS facility or the waker
    /// cannot be created.
    pub fn new() -> Result<Self, MultiplexError> {
        let poll = Poll::new().map_err(MultiplexError::Create)?;
        let waker = Waker::new(poll.registry(), WAKE_TOKEN).map_err(MultiplexError::Create)?;
        Ok(Self {
            poll,
            events: Events::with_capacity(EVENT_CAPACITY),
            waker: Arc::new(waker),
            registered: BTreeSet::new(),
            rearm: Vec::new(),
        })
    }

    /// A handle that stops the loop from another thread.
    ///
    /// Setting the flag alone would leave the loop asleep for up to one wait
    /// timeout; the waker cuts the current wait short.
    pub fn shutdown_handle(&self, running: Arc<AtomicBool>) -> ShutdownHandle {
        ShutdownHandle {
            running,
            waker: Arc::clone(&self.waker),
        }
    }

    fn rearm_ready(&mut self) {
        for descriptor in std::mem::take(&mut self.rearm) {
            if !self.registered.contains(&descriptor) {
                continue;
            }
            let raw = descriptor.raw();
            if let Err(e) = self.poll.registry().reregister(
                &mut SourceFd(&raw),
                token_for(descriptor),
                Interest::READABLE,
            ) {
                warn!(%descriptor, "failed to re-arm readiness: {e}");
            }
        }
    }
}

impl Multiplexer for MioMultiplexer {
    fn watch(&mut self, descriptor: Descriptor) -> Result<(), MultiplexError> {
        let raw = descriptor.raw();
        if raw < 0 {
            return Err(MultiplexError::Watch {
                descriptor,
                source: io::Error::from(io::ErrorKind::InvalidInput),
            });
        }
        self.poll
            .registry()
            .register(&mut SourceFd(&raw), token_for(descriptor), Interest::READABLE)
            .map_err(|source| MultiplexError::Watch { descriptor, source })?;
        self.registered.insert(descriptor);
        trace!(%descriptor, "watching");
        Ok(())
    }

    fn unwatch(&mut self, descriptor: Descriptor) {
        if !self.registered.remove(&descriptor) {
            return;
        }
        self.rearm.retain(|d| *d != descriptor);
        let raw = descriptor.raw();
        if let Err(e) = self.poll.registry().deregister(&mut SourceFd(&raw)) {
            debug!(%descriptor, "deregister failed: {e}");
        }
    }

    fn wait_readable(
        &mut self,
        snapshot: &ReadinessSnapshot,
        timeout: Duration,
    ) -> Result<Readiness, MultiplexError> {
        self.rearm_ready();

        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                debug!("readiness wait interrupted");
                return Ok(Readiness::timeout());
            }
            Err(e) => return Err(MultiplexError::Wait(e)),
        }

        if self.events.is_empty() {
            return Ok(Readiness::timeout());
        }

        let mut ready = BTreeSet::new();
        for event in self.events.iter() {
            let token = event.token();
            if token == WAKE_TOKEN {
                trace!("woken");
                continue;
            }
            let descriptor = descriptor_for(token);
            self.rearm.push(descriptor);
            if snapshot.contains(descriptor)
                && (event.is_readable() || event.is_read_closed() || event.is_error())
            {
                ready.insert(descriptor);
            }
        }

        Ok(Readiness {
            outcome: WaitOutcome::Ready,
            ready,
        })
    }
}

/// Stops a running event loop from any thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Clears the running flag and interrupts the current wait.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            warn!("failed to wake event loop: {e}");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
