// ## 📂 File: `src/transport/memory.rs`
// ## In-process duplex transport (loopback for sessions and tests)

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;

use crate::constants::NO_TIMEOUT;
use crate::transport::TransportSession;
use crate::types::{SessionError, StateError};
use crate::utils::timed_out;

/// One end of an in-memory byte pipe.
///
/// Writes are delivered as whole chunks to the peer; reads drain them in
/// order, splitting a chunk across calls when `buf` is short. Dropping or
/// closing an end makes the peer see end-of-stream after it drained what was
/// already sent.
pub struct MemoryTransport {
    tx: Mutex<Option<Sender<Bytes>>>,
    rx: Receiver<Bytes>,
    pending: Mutex<Bytes>,
    timeout: Mutex<Duration>,
    closed: AtomicBool,
    // Dropping the sender wakes a reader parked in `select!`.
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
}

enum Recv {
    Data(Bytes),
    Eof,
    Closed,
    TimedOut,
}

/// Connected pair of in-memory transports.
pub fn pipe() -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = channel::unbounded();
    let (b_tx, a_rx) = channel::unbounded();
    (MemoryTransport::new(a_tx, a_rx), MemoryTransport::new(b_tx, b_rx))
}

fn poisoned<T>(_: T) -> SessionError {
    SessionError::State(StateError::LockPoisoned)
}

impl MemoryTransport {
    fn new(tx: Sender<Bytes>, rx: Receiver<Bytes>) -> Self {
        let (close_tx, close_rx) = channel::bounded(0);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
            pending: Mutex::new(Bytes::new()),
            timeout: Mutex::new(NO_TIMEOUT),
            closed: AtomicBool::new(false),
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::closed());
        }
        Ok(())
    }

    fn recv(&self, timeout: Duration) -> Recv {
        if timeout == NO_TIMEOUT {
            select! {
                recv(self.rx) -> msg => msg.map(Recv::Data).unwrap_or(Recv::Eof),
                recv(self.close_rx) -> _ => Recv::Closed,
            }
        } else {
            select! {
                recv(self.rx) -> msg => msg.map(Recv::Data).unwrap_or(Recv::Eof),
                recv(self.close_rx) -> _ => Recv::Closed,
                default(timeout) => Recv::TimedOut,
            }
        }
    }
}

impl TransportSession for MemoryTransport {
    fn read_timeout(&self) -> Result<Duration, SessionError> {
        self.ensure_open()?;
        Ok(*self.timeout.lock().map_err(poisoned)?)
    }

    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        *self.timeout.lock().map_err(poisoned)? = timeout;
        Ok(())
    }

    /// Channels are unbounded, so a write never blocks and any bound holds.
    fn set_write_timeout(&self, _timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut pending = self.pending.lock().map_err(poisoned)?;
        while pending.is_empty() {
            let timeout = *self.timeout.lock().map_err(poisoned)?;
            match self.recv(timeout) {
                Recv::Data(chunk) => *pending = chunk,
                Recv::Eof => return Ok(0),
                Recv::Closed => return Err(SessionError::closed()),
                Recv::TimedOut => return Err(timed_out("memory transport read").into()),
            }
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::closed());
        }

        let n = buf.len().min(pending.len());
        let chunk = pending.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> Result<(), SessionError> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(());
        }

        let tx = self.tx.lock().map_err(poisoned)?;
        let Some(tx) = tx.as_ref() else {
            return Err(SessionError::closed());
        };
        tx.send(Bytes::copy_from_slice(buf)).map_err(|_| {
            SessionError::Transport(io::Error::new(io::ErrorKind::BrokenPipe, "peer hung up"))
        })
    }

    fn close(&self) -> Result<(), SessionError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Hang up towards the peer, then wake our own blocked reader.
        self.tx.lock().map_err(poisoned)?.take();
        self.close_tx.lock().map_err(poisoned)?.take();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
