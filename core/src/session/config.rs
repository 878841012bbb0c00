// ## 📂 File: `src/session/config.rs`

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_RECORD_SIZE, MAX_RECORD_SIZE, MIN_RECORD_SIZE};
use crate::crypto::{CipherSuite, HkdfPrf};
use crate::types::SessionError;

/// Security scheme picked by negotiation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityScheme {
    /// No transform: the raw transport is used as-is.
    #[serde(rename = "plain")]
    Plain,
    #[default]
    #[serde(rename = "aes256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    Chacha20Poly1305,
}

impl SecurityScheme {
    pub fn cipher_suite(self) -> Option<CipherSuite> {
        match self {
            SecurityScheme::Plain => None,
            SecurityScheme::Aes256Gcm => Some(CipherSuite::Aes256Gcm),
            SecurityScheme::Chacha20Poly1305 => Some(CipherSuite::Chacha20Poly1305),
        }
    }

    pub fn is_secured(self) -> bool {
        self != SecurityScheme::Plain
    }
}

/// Session configuration.
///
/// Every field has a default, so `{}` is a valid JSON config
/// (AES-256-GCM, HKDF-SHA-256, 16 KiB records, close notify required).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecureSessionConfig {
    pub scheme: SecurityScheme,
    pub prf: HkdfPrf,
    /// Largest plaintext carried by one record.
    pub max_record_size: usize,
    /// Treat EOF without an authenticated close record as a transport failure.
    pub require_close_notify: bool,
    /// Read timeout pushed to the transport at construction (`None` leaves it alone,
    /// `Some(0)` means block indefinitely).
    pub read_timeout_ms: Option<u64>,
}

impl Default for SecureSessionConfig {
    fn default() -> Self {
        Self {
            scheme: SecurityScheme::default(),
            prf: HkdfPrf::default(),
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            require_close_notify: true,
            read_timeout_ms: None,
        }
    }
}

impl SecureSessionConfig {
    pub fn new(scheme: SecurityScheme) -> Self {
        Self { scheme, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::Config(format!("invalid session config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(self).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&self.max_record_size) {
            return Err(SessionError::Config(format!(
                "invalid max_record_size: {}, must be within {}..={}",
                self.max_record_size, MIN_RECORD_SIZE, MAX_RECORD_SIZE
            )));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
