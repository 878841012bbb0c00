// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! HKDF-based traffic key derivation from the negotiated shared secret and salt.
//!
//! Design:
//! - HKDF-Extract(secret, salt) -> PRK
//! - HKDF-Expand(PRK, info(direction)) -> 32-byte key || 12-byte IV
//!
//! Industry notes:
//! - Mirrors TLS 1.3/QUIC key schedules: one key + IV per direction.
//! - Salt must be random per session. Info binds protocol identity.

use std::fmt;

use hkdf::Hkdf;
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{KDF_LABEL, MIN_SECRET_LEN, SALT_LEN};
use crate::crypto::types::{
    CipherSuite, CryptoError, Direction, HkdfPrf, Role, KEY_LEN_32, NONCE_LEN_12,
};

const OKM_LEN: usize = KEY_LEN_32 + NONCE_LEN_12;

/// Key + IV for one traffic direction. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DirectionKeys {
    pub key: [u8; KEY_LEN_32],
    pub iv: [u8; NONCE_LEN_12],
}

impl DirectionKeys {
    /// Short public fingerprint for logs. Never log the key itself.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::hash(&self.key);
        hex::encode(&digest.as_bytes()[..4])
    }
}

impl fmt::Debug for DirectionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectionKeys({})", self.fingerprint())
    }
}

/// Send/receive keys for one end of the session.
#[derive(Debug, Clone)]
pub struct TrafficKeys {
    pub send: DirectionKeys,
    pub recv: DirectionKeys,
}

#[inline]
/// Build HKDF 'info' binding label, suite, PRF and direction.
fn build_info(suite: CipherSuite, prf: HkdfPrf, direction: Direction) -> Vec<u8> {
    let mut info = Vec::with_capacity(KDF_LABEL.len() + 8);
    info.extend_from_slice(KDF_LABEL);
    info.extend_from_slice(&suite.id().to_le_bytes());
    info.extend_from_slice(&prf.id().to_le_bytes());
    info.extend_from_slice(direction.label());
    info
}

fn validate_inputs(secret: &[u8], salt: &[u8; SALT_LEN]) -> Result<(), CryptoError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CryptoError::Failure(format!(
            "shared secret too short: {} < {}", secret.len(), MIN_SECRET_LEN
        )));
    }
    if salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::Failure("salt must not be all-zero".into()));
    }
    Ok(())
}

/// Derive key + IV for a single direction.
///
/// Errors:
/// - secret shorter than `MIN_SECRET_LEN` or an all-zero salt.
pub fn derive_direction_keys(
    secret: &[u8],
    salt: &[u8; SALT_LEN],
    suite: CipherSuite,
    prf: HkdfPrf,
    direction: Direction,
) -> Result<DirectionKeys, CryptoError> {
    validate_inputs(secret, salt)?;

    let info = build_info(suite, prf, direction);
    let mut okm = [0u8; OKM_LEN];

    match prf {
        HkdfPrf::Sha256 => {
            Hkdf::<Sha256>::new(Some(&salt[..]), secret)
                .expand(&info, &mut okm)
                .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
        }
        HkdfPrf::Sha512 => {
            Hkdf::<Sha512>::new(Some(&salt[..]), secret)
                .expand(&info, &mut okm)
                .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-512)".into()))?;
        }
        HkdfPrf::Blake3K => {
            let mut extract = blake3::Hasher::new();
            extract.update(b"SSR1|HKDF|EXTRACT");
            extract.update(secret);
            extract.update(salt);
            let prk = extract.finalize();

            let mut expand = blake3::Hasher::new_keyed(prk.as_bytes());
            expand.update(b"SSR1|HKDF|EXPAND");
            expand.update(&info);
            expand.finalize_xof().fill(&mut okm);
        }
    }

    let mut keys = DirectionKeys {
        key: [0u8; KEY_LEN_32],
        iv: [0u8; NONCE_LEN_12],
    };
    keys.key.copy_from_slice(&okm[..KEY_LEN_32]);
    keys.iv.copy_from_slice(&okm[KEY_LEN_32..]);
    okm.zeroize();

    Ok(keys)
}

/// Derive both directions for the local `role`.
///
/// The initiator's `send` equals the responder's `recv` and vice versa.
pub fn derive_traffic_keys(
    secret: &[u8],
    salt: &[u8; SALT_LEN],
    suite: CipherSuite,
    prf: HkdfPrf,
    role: Role,
) -> Result<TrafficKeys, CryptoError> {
    let send = derive_direction_keys(secret, salt, suite, prf, Direction::sending(role))?;
    let recv = derive_direction_keys(secret, salt, suite, prf, Direction::receiving(role))?;
    Ok(TrafficKeys { send, recv })
}
