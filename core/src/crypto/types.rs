// ## 📂 File: `src/crypto/types.rs`

use std::fmt;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::{cipher_ids, prf_ids};
use crate::utils::enum_name_or_hex;

/// Stable key and nonce sizes.
pub const KEY_LEN_32: usize = 32;

/// Standard 12-byte nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// Cipher suites (record registry).
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CipherSuite {
    Aes256Gcm        = cipher_ids::AES256_GCM,
    Chacha20Poly1305 = cipher_ids::CHACHA20_POLY1305,
}

impl CipherSuite {
    #[inline]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Map a negotiated suite id back to a suite.
    pub fn from_id(cipher_id: u16) -> Result<Self, CryptoError> {
        Self::try_from_primitive(cipher_id).map_err(|_| CryptoError::UnsupportedCipher { cipher_id })
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes256Gcm => "aes256-gcm",
            CipherSuite::Chacha20Poly1305 => "chacha20-poly1305",
        }
    }
}

/// HKDF PRF choices for the traffic key schedule.
#[repr(u16)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HkdfPrf {
    #[default]
    Sha256  = prf_ids::SHA256,
    Sha512  = prf_ids::SHA512,
    Blake3K = prf_ids::BLAKE3K,
}

impl HkdfPrf {
    #[inline]
    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(prf_id: u16) -> Result<Self, CryptoError> {
        Self::try_from_primitive(prf_id).map_err(|_| CryptoError::UnsupportedPrf { prf_id })
    }
}

/// Which end of the negotiated session we are.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Initiator,
    Responder,
}

impl Role {
    pub fn peer(self) -> Self {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }
}

/// Traffic direction, named from the initiator's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    InitiatorToResponder,
    ResponderToInitiator,
}

impl Direction {
    pub fn sending(role: Role) -> Self {
        match role {
            Role::Initiator => Direction::InitiatorToResponder,
            Role::Responder => Direction::ResponderToInitiator,
        }
    }

    pub fn receiving(role: Role) -> Self {
        Self::sending(role.peer())
    }

    pub fn label(self) -> &'static [u8] {
        match self {
            Direction::InitiatorToResponder => b"i2r",
            Direction::ResponderToInitiator => b"r2i",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// IV is invalid (e.g., all zeros).
    InvalidIv,

    /// Sequence number past the usable range.
    SequenceExhausted { sequence: u64 },
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonceError::InvalidIv => write!(f, "invalid iv: all zeros"),
            NonceError::SequenceExhausted { sequence } =>
                write!(f, "sequence space exhausted at {}", sequence),
        }
    }
}

impl std::error::Error for NonceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Unsupported cipher suite ID.
    UnsupportedCipher { cipher_id: u16 },

    /// Unsupported HKDF PRF selection.
    UnsupportedPrf { prf_id: u16 },

    /// Invalid key length provided to cipher.
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes for supported ciphers).
    InvalidNonceLen { expected: usize, actual: usize },

    /// AEAD tag mismatch (authentication failure).
    TagMismatch,

    /// Key material was already released.
    Released,

    /// Nonce derivation failure.
    Nonce(NonceError),

    /// General derivation or runtime error with context.
    Failure(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        match self {
            UnsupportedCipher { cipher_id } =>
                write!(f, "unsupported cipher suite: {}",
                       enum_name_or_hex::<CipherSuite>(*cipher_id)),
            UnsupportedPrf { prf_id } =>
                write!(f, "unsupported HKDF PRF: {}",
                       enum_name_or_hex::<HkdfPrf>(*prf_id)),
            InvalidKeyLen { expected, actual } =>
                write!(f, "invalid key length: expected={}, actual={}", expected, actual),
            InvalidNonceLen { expected, actual } =>
                write!(f, "invalid nonce length: expected={}, actual={}", expected, actual),
            TagMismatch =>
                write!(f, "AEAD tag mismatch"),
            Released =>
                write!(f, "key material released"),
            Nonce(e) =>
                write!(f, "nonce error: {}", e),
            Failure(msg) =>
                write!(f, "crypto failure: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<NonceError> for CryptoError {
    fn from(e: NonceError) -> Self {
        CryptoError::Nonce(e)
    }
}
