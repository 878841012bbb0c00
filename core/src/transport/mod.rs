//! transport — the byte-stream session contract.
//!
//! A `TransportSession` is one live, ordered, bidirectional byte stream with a
//! read timeout and an explicit close. Raw transports (TCP, in-memory pipes,
//! relayed streams from negotiation) implement it, and so does every secure
//! session wrapping one, so calling code never needs to know which it holds.
//!
//! Threading contract:
//! - at most one reader and one writer at a time; the two may run concurrently
//! - `close()` may be called from any thread and must wake a blocked reader
//!   and a blocked writer
//!
//! Timeouts use `Duration::ZERO` for "block indefinitely".

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::types::SessionError;

pub mod memory;
pub mod tcp;

pub use memory::{pipe, MemoryTransport};
pub use tcp::TcpTransport;

pub trait TransportSession: Send + Sync {
    /// Current read timeout (`Duration::ZERO` = none).
    fn read_timeout(&self) -> Result<Duration, SessionError>;

    /// Change the read timeout for subsequent reads.
    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError>;

    /// Bound how long a single `write` may block (`Duration::ZERO` = none).
    ///
    /// Transports whose writes can stall should override this. The default
    /// reports `Unsupported`, and callers that need a bounded write then skip it.
    fn set_write_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        let _ = timeout;
        Err(io::Error::new(io::ErrorKind::Unsupported, "write timeout not supported").into())
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means a clean end of stream.
    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError>;

    /// Write all of `buf` or fail.
    ///
    /// A transient error (timed out, would block, interrupted) must mean that
    /// no byte of `buf` reached the peer, so the caller can resend it whole.
    /// A write that stops part way must fail with a non-transient error.
    fn write(&self, buf: &[u8]) -> Result<(), SessionError>;

    /// Close the session. Calling it again is a no-op.
    fn close(&self) -> Result<(), SessionError>;

    fn is_closed(&self) -> bool;
}

impl<S: TransportSession + ?Sized> TransportSession for Box<S> {
    fn read_timeout(&self) -> Result<Duration, SessionError> {
        (**self).read_timeout()
    }
    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        (**self).set_read_timeout(timeout)
    }
    fn set_write_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        (**self).set_write_timeout(timeout)
    }
    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError> {
        (**self).read(buf)
    }
    fn write(&self, buf: &[u8]) -> Result<(), SessionError> {
        (**self).write(buf)
    }
    fn close(&self) -> Result<(), SessionError> {
        (**self).close()
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: TransportSession + ?Sized> TransportSession for Arc<S> {
    fn read_timeout(&self) -> Result<Duration, SessionError> {
        (**self).read_timeout()
    }
    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        (**self).set_read_timeout(timeout)
    }
    fn set_write_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        (**self).set_write_timeout(timeout)
    }
    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError> {
        (**self).read(buf)
    }
    fn write(&self, buf: &[u8]) -> Result<(), SessionError> {
        (**self).write(buf)
    }
    fn close(&self) -> Result<(), SessionError> {
        (**self).close()
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
