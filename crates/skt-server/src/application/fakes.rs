//! In-memory stand-ins for the capability traits, used by the driver's unit
//! tests.  Each fake shares its recorded state through an `Arc<Mutex<_>>` so
//! a test can keep a handle after boxing the fake into the driver.

use std::collections::{BTreeSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::multiplexer::{MultiplexError, Multiplexer, Readiness};
use crate::application::transport::{
    AcceptError, AcceptedConnection, ConnectionSource, ReadOutcome, Transport,
};
use crate::domain::{Descriptor, ReadinessSnapshot};

// ── Transport ─────────────────────────────────────────────────────────────────

/// One scripted result for [`FakeTransport::read`].
#[derive(Debug)]
pub enum ScriptedRead {
    Data(Vec<u8>),
    Closed,
    Fail(io::ErrorKind),
}

/// What a [`FakeTransport`] has seen.
#[derive(Debug, Default)]
pub struct TransportLog {
    /// Results handed out by `read`; an empty queue reads as `WouldBlock`.
    pub reads: VecDeque<ScriptedRead>,
    pub written: Vec<u8>,
    pub fail_writes: bool,
    /// Maximum bytes accepted per `write` call; `None` accepts everything.
    pub write_chunk: Option<usize>,
    pub close_calls: usize,
    /// Length of every buffer offered to `read`.
    pub offered: Vec<usize>,
}

impl TransportLog {
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn new() -> (Self, Arc<Mutex<TransportLog>>) {
        let log = Arc::new(Mutex::new(TransportLog::default()));
        (Self { log: Arc::clone(&log) }, log)
    }
}

impl Transport for FakeTransport {
    fn read(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let mut log = self.log.lock().unwrap();
        log.offered.push(buf.len());
        match log.reads.pop_front() {
            Some(ScriptedRead::Data(payload)) => {
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
                ReadOutcome::Data(n)
            }
            Some(ScriptedRead::Closed) => ReadOutcome::Closed,
            Some(ScriptedRead::Fail(kind)) => ReadOutcome::Failed(io::Error::from(kind)),
            None => ReadOutcome::WouldBlock,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut log = self.log.lock().unwrap();
        if log.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        let n = log.write_chunk.map_or(bytes.len(), |c| c.min(bytes.len()));
        log.written.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn close(&mut self) {
        self.log.lock().unwrap().close_calls += 1;
    }
}

// ── ConnectionSource ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SourceLog {
    pub close_calls: usize,
}

pub struct FakeSource {
    listener: Descriptor,
    pending: VecDeque<Result<AcceptedConnection, AcceptError>>,
    log: Arc<Mutex<SourceLog>>,
}

impl FakeSource {
    pub fn new(listener: Descriptor) -> (Self, Arc<Mutex<SourceLog>>) {
        let log = Arc::new(Mutex::new(SourceLog::default()));
        let source = Self {
            listener,
            pending: VecDeque::new(),
            log: Arc::clone(&log),
        };
        (source, log)
    }

    /// Queues a connection for the next accept and returns its transport log.
    pub fn push_connection(&mut self, descriptor: Descriptor) -> Arc<Mutex<TransportLog>> {
        let (transport, log) = FakeTransport::new();
        self.pending.push_back(Ok(AcceptedConnection {
            descriptor,
            peer: None,
            transport: Box::new(transport),
        }));
        log
    }

    pub fn push_error(&mut self, error: AcceptError) {
        self.pending.push_back(Err(error));
    }
}

impl ConnectionSource for FakeSource {
    fn descriptor(&self) -> Descriptor {
        self.listener
    }

    fn accept(&mut self) -> Result<AcceptedConnection, AcceptError> {
        self.pending
            .pop_front()
            .unwrap_or_else(|| Err(AcceptError::Io(io::Error::from(io::ErrorKind::WouldBlock))))
    }

    fn close(&mut self) {
        self.log.lock().unwrap().close_calls += 1;
    }
}

// ── Multiplexer ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MuxLog {
    pub watched: BTreeSet<Descriptor>,
    pub unwatch_calls: Vec<Descriptor>,
    pub snapshots: Vec<ReadinessSnapshot>,
    pub timeouts: Vec<Duration>,
    /// Descriptors whose `watch` should fail.
    pub refuse: BTreeSet<Descriptor>,
}

/// Replays a script of wait results.  When the script runs out every wait
/// reports a timeout.
pub struct ScriptedMultiplexer {
    script: VecDeque<Result<Readiness, MultiplexError>>,
    log: Arc<Mutex<MuxLog>>,
}

impl ScriptedMultiplexer {
    pub fn new() -> (Self, Arc<Mutex<MuxLog>>) {
        let log = Arc::new(Mutex::new(MuxLog::default()));
        let mux = Self {
            script: VecDeque::new(),
            log: Arc::clone(&log),
        };
        (mux, log)
    }

    pub fn then(mut self, step: Result<Readiness, MultiplexError>) -> Self {
        self.script.push_back(step);
        self
    }
}

impl Multiplexer for ScriptedMultiplexer {
    fn watch(&mut self, descriptor: Descriptor) -> Result<(), MultiplexError> {
        let mut log = self.log.lock().unwrap();
        if log.refuse.contains(&descriptor) {
            return Err(MultiplexError::Watch {
                descriptor,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        log.watched.insert(descriptor);
        Ok(())
    }

    fn unwatch(&mut self, descriptor: Descriptor) {
        let mut log = self.log.lock().unwrap();
        log.watched.remove(&descriptor);
        log.unwatch_calls.push(descriptor);
    }

    fn wait_readable(
        &mut self,
        snapshot: &ReadinessSnapshot,
        timeout: Duration,
    ) -> Result<Readiness, MultiplexError> {
        {
            let mut log = self.log.lock().unwrap();
            log.snapshots.push(snapshot.clone());
            log.timeouts.push(timeout);
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(Readiness::timeout()))
    }
}
