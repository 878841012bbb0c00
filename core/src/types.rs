use std::io;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::record::RecordError;

/// Coarse failure class callers branch on.
///
/// `Transport` → the wire broke (maybe retry / reconnect).
/// `Integrity` → the payload was tampered with or truncated (drop the peer).
/// `State`     → the session was used outside its lifecycle.
/// `Config`    → the session could not be set up from what was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Integrity,
    State,
    Config,
}

/// Decode-side rejection of inbound bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// AEAD authentication failed for the record at `sequence`.
    #[error("record {sequence} failed authentication")]
    TagMismatch { sequence: u64 },

    /// Record carried an unexpected sequence number (replay, drop or reorder).
    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u64, got: u64 },

    /// Header did not parse or is inconsistent with the transform.
    #[error("malformed record: {0}")]
    Malformed(RecordError),

    /// Stream ended in the middle of a record.
    #[error("stream truncated mid-record: have {have} of {need} bytes")]
    Truncated { have: usize, need: usize },

    /// A previous integrity failure left the read side unusable.
    #[error("read side poisoned by earlier failure: {0}")]
    Poisoned(Box<IntegrityError>),
}

/// Lifecycle violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("session closed")]
    Closed,

    #[error("no transport session supplied")]
    NoTransport,

    #[error("transport session already closed")]
    TransportClosed,

    #[error("sequence space exhausted")]
    SequenceExhausted,

    #[error("retry payload differs from the pending failed write")]
    RetryMismatch,

    #[error("session lock poisoned")]
    LockPoisoned,
}

/// Unified session error covering transport, integrity, lifecycle and setup.
/// - Ergonomic `From<T>` impls enable `?` across layers.
/// - `kind()` lets callers apply security policy without string inspection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O failure reported by the wrapped transport, passed through unchanged.
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    /// Inbound bytes were corrupted, replayed, reordered or truncated.
    #[error("integrity failure: {0}")]
    Integrity(#[from] IntegrityError),

    /// Operation attempted outside the session lifecycle.
    #[error("state failure: {0}")]
    State(#[from] StateError),

    /// Invalid key material or cipher selection detected at setup.
    #[error("crypto setup failure: {0}")]
    Crypto(#[from] CryptoError),

    /// Invalid configuration detected at setup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Transport(_) => ErrorKind::Transport,
            SessionError::Integrity(_) => ErrorKind::Integrity,
            SessionError::State(_) => ErrorKind::State,
            SessionError::Crypto(_) | SessionError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn closed() -> Self {
        SessionError::State(StateError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionError::State(StateError::Closed))
    }

    /// True for a read or write that ran out its configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SessionError::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Transport errors that leave the transport usable (timeout, interrupt).
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Transport(e) => crate::utils::is_transient_io(e),
            _ => false,
        }
    }
}

impl From<RecordError> for IntegrityError {
    fn from(e: RecordError) -> Self {
        IntegrityError::Malformed(e)
    }
}

impl From<RecordError> for SessionError {
    fn from(e: RecordError) -> Self {
        SessionError::Integrity(IntegrityError::Malformed(e))
    }
}

impl From<SessionError> for io::Error {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Transport(inner) => inner,
            SessionError::Integrity(_) => io::Error::new(io::ErrorKind::InvalidData, e),
            SessionError::State(_) => io::Error::new(io::ErrorKind::NotConnected, e),
            SessionError::Crypto(_) | SessionError::Config(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
        }
    }
}
