// ## 📂 File: `src/crypto/nonce.rs`

//! Deterministic per-record nonce derivation from a traffic IV and sequence number.
//!
//! Design:
//! - TLS 1.3-like scheme: take the 12-byte traffic IV, then XOR the low 8 bytes
//!   with the little-endian record sequence number.
//!
//! Security notes:
//! - Never reuse the same (key, sequence) pair. Sequence numbers only advance
//!   once a record has been handed to the transport in full.
//! - Do not use all-zero IVs. Validate before deriving.

use crate::constants::MAX_SEQUENCE;
use crate::crypto::types::{NonceError, NONCE_LEN_12};

/// Derive a 12-byte AEAD nonce from a traffic IV and a record sequence number.
///
/// - Base IV: the 12 IV bytes become the starting nonce.
/// - Counter: XOR positions 4..12 with `sequence` in little-endian, keeping a
///   fixed 4-byte prefix and a varying 8-byte tail.
/// - This schedule must be identical for seal and open.
#[inline]
pub fn derive_nonce_12_tls_style(
    iv: &[u8; NONCE_LEN_12],
    sequence: u64,
) -> Result<[u8; NONCE_LEN_12], NonceError> {
    validate_iv(iv)?;
    if sequence > MAX_SEQUENCE {
        return Err(NonceError::SequenceExhausted { sequence });
    }

    let mut nonce = *iv;
    let ctr: [u8; 8] = sequence.to_le_bytes();
    for j in 0..8 {
        nonce[4 + j] ^= ctr[j];
    }

    Ok(nonce)
}

/// Validate that the IV is not all zeros.
#[inline]
pub fn validate_iv(iv: &[u8; NONCE_LEN_12]) -> Result<(), NonceError> {
    if iv.iter().all(|&b| b == 0) {
        return Err(NonceError::InvalidIv);
    }
    Ok(())
}
