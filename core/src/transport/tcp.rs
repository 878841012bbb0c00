// ## 📂 File: `src/transport/tcp.rs`

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::transport::TransportSession;
use crate::types::SessionError;
use crate::utils::{is_transient_io, timeout_from_os, timeout_to_os};

/// Raw socket transport.
///
/// Reads and writes go through `&TcpStream`, so one reader and one writer can
/// run at the same time. `close()` shuts the socket down in both directions,
/// which wakes a reader blocked in `recv` and a writer blocked in `send`.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    closed: AtomicBool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            closed: AtomicBool::new(false),
        }
    }

    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, SessionError> {
        Ok(self.stream.peer_addr()?)
    }

    /// `write_all` that never reports a stall as transient once bytes are out.
    fn write_all_or_nothing(&self, buf: &[u8]) -> io::Result<()> {
        let mut stream = &self.stream;
        let mut written = 0;
        while written < buf.len() {
            match stream.write(&buf[written..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if written > 0 && is_transient_io(&e) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        format!("write stalled after {written} of {} bytes: {e}", buf.len()),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        stream.flush()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::closed());
        }
        Ok(())
    }
}

impl TransportSession for TcpTransport {
    fn read_timeout(&self) -> Result<Duration, SessionError> {
        self.ensure_open()?;
        Ok(timeout_from_os(self.stream.read_timeout()?))
    }

    fn set_read_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.stream.set_read_timeout(timeout_to_os(timeout))?;
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, SessionError> {
        self.ensure_open()?;
        let res = (&self.stream).read(buf);
        // A shutdown from `close()` surfaces as EOF or an error on this side.
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::closed());
        }
        Ok(res?)
    }

    fn set_write_timeout(&self, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.stream.set_write_timeout(timeout_to_os(timeout))?;
        Ok(())
    }

    fn write(&self, buf: &[u8]) -> Result<(), SessionError> {
        self.ensure_open()?;
        let res = self.write_all_or_nothing(buf);
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::closed());
        }
        Ok(res?)
    }

    fn close(&self) -> Result<(), SessionError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!(peer = ?self.stream.peer_addr().ok(), "tcp transport closing");
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already gone: the socket is closed either way.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
