use std::fmt;
use std::io;
use std::time::Duration;
use num_enum::TryFromPrimitive;

use crate::constants::NO_TIMEOUT;

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// I/O kinds after which the same transport can be used again.
#[inline]
pub fn is_transient_io(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Session timeout → OS timeout (`ZERO` means "no timeout").
#[inline]
pub fn timeout_to_os(timeout: Duration) -> Option<Duration> {
    if timeout == NO_TIMEOUT { None } else { Some(timeout) }
}

/// OS timeout → session timeout.
#[inline]
pub fn timeout_from_os(timeout: Option<Duration>) -> Duration {
    timeout.unwrap_or(NO_TIMEOUT)
}

pub fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{what} timed out"))
}
