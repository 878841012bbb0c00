// ## 📂 File: `src/session/builder.rs`
// ## Session construction from negotiated parameters

use std::fmt;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::constants::SALT_LEN;
use crate::crypto::Role;
use crate::session::adapter::{SecureSession, SessionOptions};
use crate::session::aead::AeadTransform;
use crate::session::config::{SecureSessionConfig, SecurityScheme};
use crate::transport::TransportSession;
use crate::types::{ErrorKind, SessionError, StateError};

/// Collects what negotiation produced and assembles a session from it.
///
/// The transport is the only thing every scheme needs; `secret` and `salt`
/// are required for secured schemes and ignored for `plain`.
pub struct SecureSessionBuilder<T> {
    config: SecureSessionConfig,
    transport: Option<T>,
    secret: Option<Zeroizing<Vec<u8>>>,
    salt: Option<[u8; SALT_LEN]>,
    role: Role,
}

impl<T: TransportSession> SecureSessionBuilder<T> {
    pub fn new(config: SecureSessionConfig) -> Self {
        Self {
            config,
            transport: None,
            secret: None,
            salt: None,
            role: Role::default(),
        }
    }

    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(Zeroizing::new(secret.to_vec()));
        self
    }

    pub fn salt(mut self, salt: [u8; SALT_LEN]) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Everything that can fail before the transport is touched.
    fn transform(&self, transport: &T) -> Result<AeadTransform, SessionError> {
        self.config.validate()?;
        let Some(suite) = self.config.scheme.cipher_suite() else {
            return Err(SessionError::Config(
                "plain scheme has no transform, use build_boxed()".into(),
            ));
        };
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| SessionError::Config("missing shared secret".into()))?;
        let salt = self
            .salt
            .ok_or_else(|| SessionError::Config("missing salt".into()))?;
        if transport.is_closed() {
            return Err(StateError::TransportClosed.into());
        }
        Ok(AeadTransform::derive(suite, self.config.prf, secret, &salt, self.role)?)
    }

    fn apply_timeout(&self, transport: &T) -> Result<(), SessionError> {
        if let Some(timeout) = self.config.read_timeout() {
            transport.set_read_timeout(timeout)?;
        }
        Ok(())
    }

    /// Build an AEAD-protected session.
    ///
    /// Fails with `StateError::NoTransport` when no transport was supplied,
    /// before anything else is looked at. Any other failure hands the
    /// transport back through [`BuildError::into_transport`], with its read
    /// timeout unchanged.
    pub fn build(mut self) -> Result<SecureSession<T, AeadTransform>, BuildError<T>> {
        let Some(transport) = self.transport.take() else {
            return Err(BuildError::new(StateError::NoTransport.into(), None));
        };
        let transform = match self.transform(&transport) {
            Ok(transform) => transform,
            Err(error) => return Err(BuildError::new(error, Some(transport))),
        };
        if let Err(error) = self.apply_timeout(&transport) {
            return Err(BuildError::new(error, Some(transport)));
        }
        SecureSession::new(transport, transform, SessionOptions::from(&self.config))
            .map_err(|error| BuildError::new(error, None))
    }
}

impl<T: TransportSession + 'static> SecureSessionBuilder<T> {
    /// Build whatever the configured scheme asks for behind the common contract.
    /// `plain` hands the transport back unchanged.
    pub fn build_boxed(mut self) -> Result<Box<dyn TransportSession>, BuildError<T>> {
        if self.config.scheme != SecurityScheme::Plain {
            return Ok(Box::new(self.build()?));
        }
        let Some(transport) = self.transport.take() else {
            return Err(BuildError::new(StateError::NoTransport.into(), None));
        };
        if let Err(error) = self.config.validate().and_then(|_| self.apply_timeout(&transport)) {
            return Err(BuildError::new(error, Some(transport)));
        }
        Ok(Box::new(transport))
    }
}

/// A failed build, carrying the unconsumed transport when there was one.
pub struct BuildError<T> {
    error: SessionError,
    transport: Option<T>,
}

impl<T> BuildError<T> {
    fn new(error: SessionError, transport: Option<T>) -> Self {
        Self { error, transport }
    }

    pub fn error(&self) -> &SessionError {
        &self.error
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn into_error(self) -> SessionError {
        self.error
    }

    /// The transport the builder was given, still open, if it got that far.
    pub fn into_transport(self) -> Option<T> {
        self.transport
    }

    pub fn into_parts(self) -> (SessionError, Option<T>) {
        (self.error, self.transport)
    }
}

impl<T> fmt::Debug for BuildError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildError")
            .field("error", &self.error)
            .field("transport_returned", &self.transport.is_some())
            .finish()
    }
}

impl<T> fmt::Display for BuildError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> std::error::Error for BuildError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<BuildError<T>> for SessionError {
    fn from(e: BuildError<T>) -> Self {
        e.error
    }
}

/// Fresh random salt for the initiator to send during negotiation.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// One-call helper for the common case.
pub fn open_secure_session<T: TransportSession>(
    transport: T,
    config: SecureSessionConfig,
    secret: &[u8],
    salt: [u8; SALT_LEN],
    role: Role,
) -> Result<SecureSession<T, AeadTransform>, BuildError<T>> {
    SecureSessionBuilder::new(config)
        .transport(transport)
        .secret(secret)
        .salt(salt)
        .role(role)
        .build()
}
