// ## 📂 File: `src/session/adapter.rs`
// ## Secure session over one exclusively owned transport

//! `SecureSession` decorates a `TransportSession` with a record transform and
//! exposes the very same `TransportSession` contract.
//!
//! Design notes:
//! - Timeouts are delegated on every call, never cached.
//! - Read and write halves sit behind separate locks, so one reader and one
//!   writer can run at once. Same-direction calls are serialized.
//! - Lifecycle is a single atomic `Open → Closed` flag. `close()` never waits
//!   on a half's lock: the close notify is skipped when the writer is busy or
//!   the transport cannot bound the write, and a busy half wipes itself when
//!   its call returns.
//! - Sequence numbers advance only after the full block reached the transport.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::constants::{
    CLOSE_NOTIFY_TIMEOUT, DEFAULT_MAX_RECORD_SIZE, MAX_RECORD_SIZE, MAX_SEQUENCE,
    MIN_RECORD_SIZE, READ_CHUNK,
};
use crate::crypto::{CryptoError, NonceError};
use crate::record::{decode_record, encode_record_into, parse_record_header, RecordHeader, RecordType};
use crate::session::config::SecureSessionConfig;
use crate::session::transform::{RecordOpener, RecordSealer, SessionTransform};
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot};
use crate::transport::TransportSession;
use crate::types::{IntegrityError, SessionError, StateError};

const OPEN: u8 = 0;
const CLOSED: u8 = 1;

/// Knobs the adapter itself needs (the transform carries its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub max_record_size: usize,
    pub require_close_notify: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            require_close_notify: true,
        }
    }
}

impl SessionOptions {
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&self.max_record_size) {
            return Err(SessionError::Config(format!(
                "invalid max_record_size: {}", self.max_record_size
            )));
        }
        Ok(())
    }
}

impl From<&SecureSessionConfig> for SessionOptions {
    fn from(config: &SecureSessionConfig) -> Self {
        Self {
            max_record_size: config.max_record_size,
            require_close_notify: config.require_close_notify,
        }
    }
}

struct ReadHalf<O> {
    opener: O,
    next_sequence: u64,
    /// Raw bytes of a record still being received.
    inbound: BytesMut,
    /// Decoded bytes not yet handed to the caller.
    plaintext: Bytes,
    /// Authenticated close record seen, or clean EOF allowed by options.
    eof: bool,
    failure: Option<IntegrityError>,
}

impl<O: RecordOpener> ReadHalf<O> {
    fn release(&mut self) {
        self.opener.release();
        self.inbound.clear();
        self.plaintext = Bytes::new();
    }
}

/// Sealed block kept after a transient write failure, resent verbatim on retry.
struct PendingWrite {
    digest: blake3::Hash,
    wire: Vec<u8>,
    records: u64,
    plaintext_len: usize,
}

struct WriteHalf<S> {
    sealer: S,
    next_sequence: u64,
    pending: Option<PendingWrite>,
}

impl<S: RecordSealer> WriteHalf<S> {
    fn release(&mut self) {
        self.sealer.release();
        self.pending = None;
    }
}

/// Security-augmented view over exactly one transport session.
pub struct SecureSession<T: TransportSession, X: SessionTransform> {
    transport: T,
    scheme: &'static str,
    options: SessionOptions,
    state: AtomicU8,
    reader: Mutex<ReadHalf<X::Opener>>,
    writer: Mutex<WriteHalf<X::Sealer>>,
    counters: Mutex<TelemetryCounters>,
    opened_at: Instant,
}

fn poisoned<G>(_: G) -> SessionError {
    SessionError::State(StateError::LockPoisoned)
}

/// Map a sealer/opener error that is not an authentication failure.
fn transform_error(e: CryptoError) -> SessionError {
    match e {
        CryptoError::Released => SessionError::closed(),
        CryptoError::Nonce(NonceError::SequenceExhausted { .. }) => {
            SessionError::State(StateError::SequenceExhausted)
        }
        other => SessionError::Crypto(other),
    }
}

impl<T: TransportSession, X: SessionTransform> SecureSession<T, X> {
    /// Wrap `transport` with `transform`.
    ///
    /// Fails before any I/O if the transport is already closed or the
    /// options are out of range.
    pub fn new(transport: T, transform: X, options: SessionOptions) -> Result<Self, SessionError> {
        if transport.is_closed() {
            return Err(StateError::TransportClosed.into());
        }
        options.validate()?;

        let scheme = transform.name();
        let (sealer, opener) = transform.split();
        debug!(scheme, max_record_size = options.max_record_size, "secure session opened");

        Ok(Self {
            transport,
            scheme,
            options,
            state: AtomicU8::new(OPEN),
            reader: Mutex::new(ReadHalf {
                opener,
                next_sequence: 0,
                inbound: BytesMut::new(),
                plaintext: Bytes::new(),
                eof: false,
                failure: None,
            }),
            writer: Mutex::new(WriteHalf {
                sealer,
                next_sequence: 0,
                pending: None,
            }),
            counters: Mutex::new(TelemetryCounters::default()),
            opened_at: Instant::now(),
        })
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// The wrapped transport. Reading or writing it directly desyncs the session.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        let counters = self
            .counters
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default();
        TelemetrySnapshot::from(self.scheme, &counters, self.opened_at, self.is_closed())
    }

    fn count(&self, f: impl FnOnce(&mut TelemetryCounters)) {
        if let Ok(mut counters) = self.counters.lock() {
            f(&mut counters);
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state.load(Ordering::Acquire) == CLOSED {
            return Err(SessionError::closed());
        }
        Ok(())
    }

    fn lock_reader(&self) -> Result<MutexGuard<'_, ReadHalf<X::Opener>>, SessionError> {
        self.reader.lock().map_err(poisoned)
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, WriteHalf<X::Sealer>>, SessionError> {
        self.writer.lock().map_err(poisoned)
    }

    /// Open → Closed after an unrecoverable transport failure.
    fn abort(&self, cause: &SessionError) {
        if self.state.swap(CLOSED, Ordering::AcqRel) == OPEN {
            warn!(scheme = self.scheme, error = %cause, "transport failed, closing session");
            let _ = self.transport.close();
        }
    }

    /// Transport errors caused by a local `close()` report the close instead.
    fn settle(closed_locally: bool, e: SessionError) -> SessionError {
        if closed_locally && matches!(e, SessionError::Transport(_)) {
            return SessionError::closed();
        }
        e
    }

    // ================= Read path =================

    /// Pull bytes until `inbound` holds `need` bytes.
    ///
    /// Returns `Ok(false)` on a clean EOF at a record boundary.
    fn fill(&self, rx: &mut ReadHalf<X::Opener>, need: usize) -> Result<bool, SessionError> {
        let mut scratch = [0u8; READ_CHUNK];
        while rx.inbound.len() < need {
            let want = (need - rx.inbound.len()).min(READ_CHUNK);
            let n = self.transport.read(&mut scratch[..want])?;
            if n == 0 {
                let have = rx.inbound.len();
                if have > 0 {
                    return Err(IntegrityError::Truncated { have, need }.into());
                }
                if self.options.require_close_notify {
                    return Err(SessionError::Transport(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed without close notify",
                    )));
                }
                return Ok(false);
            }
            rx.inbound.extend_from_slice(&scratch[..n]);
        }
        Ok(true)
    }

    /// Receive, verify and decode exactly one record.
    fn read_record(&self, rx: &mut ReadHalf<X::Opener>) -> Result<(), SessionError> {
        // 1️⃣ Header, checked before trusting its lengths
        if !self.fill(rx, RecordHeader::LEN)? {
            rx.eof = true;
            return Ok(());
        }
        let header = parse_record_header(&rx.inbound[..RecordHeader::LEN])?;
        header.validate(rx.opener.overhead(), self.options.max_record_size)?;
        if header.sequence != rx.next_sequence {
            return Err(IntegrityError::SequenceMismatch {
                expected: rx.next_sequence,
                got: header.sequence,
            }
            .into());
        }

        // 2️⃣ Body
        let wire_len = header.wire_len();
        self.fill(rx, wire_len)?;
        let wire = rx.inbound.split_to(wire_len).freeze();
        let record = decode_record(&wire)?;

        // 3️⃣ Open
        let plaintext = rx.opener.open(&record.header, record.ciphertext).map_err(|e| match e {
            CryptoError::TagMismatch => {
                SessionError::Integrity(IntegrityError::TagMismatch { sequence: header.sequence })
            }
            other => transform_error(other),
        })?;
        if plaintext.len() != header.plaintext_len as usize {
            return Err(IntegrityError::Truncated {
                have: plaintext.len(),
                need: header.plaintext_len as usize,
            }
            .into());
        }
        rx.next_sequence += 1;
        trace!(
            sequence = header.sequence,
            kind = header.record_type.as_str(),
            len = plaintext.len(),
            "record opened"
        );
        self.count(|c| c.add_read(plaintext.len(), wire_len));

        match header.record_type {
            RecordType::Data => rx.plaintext = Bytes::from(plaintext),
            RecordType::Close => {
                debug!(scheme = self.scheme, "peer sent close notify");
                rx.eof = true;
            }
        }
        Ok(())
    }

    fn on_read_error(&self, rx: &mut ReadHalf<X::Opener>, e: SessionError) -> SessionError {
        let closed_locally = self.is_closed();
        match &e {
            SessionError::Integrity(ie) => {
                warn!(scheme = self.scheme, error = %ie, "inbound record rejected");
                self.count(|c| c.add_integrity_failure());
                rx.failure = Some(ie.clone());
            }
            SessionError::Transport(_) if e.is_transient() => {
                self.count(|c| c.add_transient_failure(e.is_timeout()));
            }
            SessionError::Transport(_) if !closed_locally => {
                self.count(|c| c.add_transport_failure());
                self.abort(&e);
            }
            _ => {}
        }
        Self::settle(closed_locally, e)
    }

    // ================= Write path =================

    /// Seal `buf` into one block of `max_record_size` records.
    fn seal_block(
        &self,
        tx: &mut WriteHalf<X::Sealer>,
        buf: &[u8],
        digest: blake3::Hash,
    ) -> Result<PendingWrite, SessionError> {
        let max = self.options.max_record_size;
        let records = buf.len().div_ceil(max) as u64;
        tx.next_sequence
            .checked_add(records - 1)
            .filter(|last| *last <= MAX_SEQUENCE)
            .ok_or(SessionError::State(StateError::SequenceExhausted))?;

        let overhead = tx.sealer.overhead();
        let mut wire = Vec::with_capacity(buf.len() + records as usize * (RecordHeader::LEN + overhead));

        for (i, chunk) in buf.chunks(max).enumerate() {
            let mut header =
                RecordHeader::unsealed(RecordType::Data, tx.next_sequence + i as u64, chunk.len() as u32);
            let ciphertext = tx.sealer.seal(&header, chunk).map_err(transform_error)?;
            header.ciphertext_len = ciphertext.len() as u32;
            encode_record_into(&mut wire, &header, &ciphertext)
                .map_err(|e| SessionError::Crypto(CryptoError::Failure(e.to_string())))?;
        }

        Ok(PendingWrite {
            digest,
            wire,
            records,
            plaintext_len: buf.len(),
        })
    }

    /// Best effort, authenticated end-of-stream marker.
    fn send_close_notify(&self) {
        let Ok(mut tx) = self.writer.try_lock() else {
            debug!(scheme = self.scheme, "writer busy, skipping close notify");
            return;
        };
        // Mid-retry the peer may hold part of a block; do not add to it.
        if tx.pending.is_some() {
            return;
        }
        // `close()` must not hang on a stalled peer.
        if let Err(e) = self.transport.set_write_timeout(CLOSE_NOTIFY_TIMEOUT) {
            debug!(scheme = self.scheme, error = %e, "transport cannot bound writes, skipping close notify");
            return;
        }

        let mut header = RecordHeader::unsealed(RecordType::Close, tx.next_sequence, 0);
        let Ok(ciphertext) = tx.sealer.seal(&header, &[]) else {
            return;
        };
        header.ciphertext_len = ciphertext.len() as u32;

        let mut wire = Vec::with_capacity(header.wire_len());
        if encode_record_into(&mut wire, &header, &ciphertext).is_err() {
            return;
        }
        match self.transport.write(&wire) {
            Ok(()) => {
                tx.next_sequence += 1;
                debug!(scheme = self.scheme, "close notify sent");
            }
            Err(e) => debug!(scheme = self.scheme, error = %e, "close notify not delivered"),
        }
    }
}

impl<T: TransportSession, X: SessionTransform> TransportSession for SecureSession<T, X> {
    fn read_timeout(&self) -> Result<Duration, SessionError> {
        self.ensure_open()?;
        self.transport.read_timeout().map_err(|e| Self::settle(self.is_closed(), e))
    }

    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.transport
            .set_read_timeout(timeout)
            .map_err(|e| Self::settle(self.is_closed(), e))
    }

    fn set_write_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.transport
            .set_write_timeout(timeout)
            .map_err(|e| Self::settle(self.is_closed(), e))
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut rx = self.lock_reader()?;
        let result = self.read_locked(&mut rx, buf);
        // `close()` skips a busy half, so the call holding it cleans up.
        if self.is_closed() {
            rx.release();
        }
        result
    }

    fn write(&self, buf: &[u8]) -> Result<(), SessionError> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(());
        }

        let mut tx = self.lock_writer()?;
        let result = self.write_locked(&mut tx, buf);
        if self.is_closed() {
            tx.release();
        }
        result
    }

    fn close(&self) -> Result<(), SessionError> {
        if self
            .state
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        self.send_close_notify();
        let result = self.transport.close();

        // A half that is busy releases itself when its call returns.
        if let Ok(mut tx) = self.writer.try_lock() {
            tx.release();
        }
        if let Ok(mut rx) = self.reader.try_lock() {
            rx.release();
        }
        debug!(scheme = self.scheme, "secure session closed");
        result
    }

    fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }
}

impl<T: TransportSession, X: SessionTransform> SecureSession<T, X> {
    fn read_locked(&self, rx: &mut ReadHalf<X::Opener>, buf: &mut [u8]) -> Result<usize, SessionError> {
        loop {
            if !rx.plaintext.is_empty() {
                let n = buf.len().min(rx.plaintext.len());
                let chunk = rx.plaintext.split_to(n);
                buf[..n].copy_from_slice(&chunk);
                return Ok(n);
            }
            if let Some(failure) = &rx.failure {
                return Err(IntegrityError::Poisoned(Box::new(failure.clone())).into());
            }
            if rx.eof {
                return Ok(0);
            }
            if let Err(e) = self.read_record(rx) {
                return Err(self.on_read_error(rx, e));
            }
        }
    }

    fn write_locked(&self, tx: &mut WriteHalf<X::Sealer>, buf: &[u8]) -> Result<(), SessionError> {
        let digest = blake3::hash(buf);
        let block = match tx.pending.take() {
            Some(pending) if pending.digest == digest => {
                self.count(|c| c.add_write_retry());
                pending
            }
            Some(pending) => {
                tx.pending = Some(pending);
                return Err(StateError::RetryMismatch.into());
            }
            None => self.seal_block(tx, buf, digest)?,
        };

        match self.transport.write(&block.wire) {
            Ok(()) => {
                tx.next_sequence += block.records;
                trace!(records = block.records, len = block.plaintext_len, "block written");
                self.count(|c| c.add_write(block.records, block.plaintext_len, block.wire.len()));
                Ok(())
            }
            Err(e) if e.is_transient() => {
                self.count(|c| c.add_transient_failure(e.is_timeout()));
                tx.pending = Some(block);
                Err(e)
            }
            Err(e) => {
                let closed_locally = self.is_closed();
                if !closed_locally && !e.is_closed() {
                    self.count(|c| c.add_transport_failure());
                    self.abort(&e);
                }
                Err(Self::settle(closed_locally, e))
            }
        }
    }
}

impl<T: TransportSession, X: SessionTransform> Drop for SecureSession<T, X> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Acquire) == OPEN {
            self.state.store(CLOSED, Ordering::Release);
            self.send_close_notify();
            let _ = self.transport.close();
        }
        // Covers a half that was busy when `close()` ran.
        if let Ok(tx) = self.writer.get_mut() {
            tx.release();
        }
        if let Ok(rx) = self.reader.get_mut() {
            rx.release();
        }
    }
}

// ================= std::io interop =================

impl<T, X> io::Read for &SecureSession<T, X>
where
    T: TransportSession,
    X: SessionTransform,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TransportSession::read(*self, buf).map_err(Into::into)
    }
}

impl<T, X> io::Write for &SecureSession<T, X>
where
    T: TransportSession,
    X: SessionTransform,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TransportSession::write(*self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
