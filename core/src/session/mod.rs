//! session — the security-augmented transport session.
//!
//! `SecureSession` wraps one `TransportSession` and a `SessionTransform`
//! (sealer + opener) and presents the same contract back to callers.

pub mod adapter;
pub mod aead;
pub mod builder;
pub mod config;
pub mod transform;

pub use adapter::{SecureSession, SessionOptions};
pub use aead::{AeadOpener, AeadSealer, AeadTransform};
pub use builder::{open_secure_session, random_salt, BuildError, SecureSessionBuilder};
pub use config::{SecureSessionConfig, SecurityScheme};
pub use transform::{RecordOpener, RecordSealer, SessionTransform};
