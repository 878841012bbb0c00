//! session-core
//!
//! Secure session adapter: authenticated, encrypted records over any
//! byte-stream transport session, behind the same session contract.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Building blocks
pub mod crypto;
pub mod record;
pub mod telemetry;

// Session layers
pub mod transport;
pub mod session;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::crypto::{CipherSuite, HkdfPrf, Role};
    pub use crate::session::{
        open_secure_session, random_salt, BuildError, SecureSession, SecureSessionBuilder,
        SecureSessionConfig, SecurityScheme, SessionOptions, SessionTransform,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::transport::{pipe, MemoryTransport, TcpTransport, TransportSession};
    pub use crate::types::{ErrorKind, IntegrityError, SessionError, StateError};
}
