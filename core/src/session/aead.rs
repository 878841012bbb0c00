// ## 📂 File: `src/session/aead.rs`

use zeroize::Zeroizing;

use crate::constants::SALT_LEN;
use crate::crypto::{
    aad::build_aad,
    aead::AeadImpl,
    derive_traffic_keys,
    nonce::derive_nonce_12_tls_style,
    CipherSuite, CryptoError, DirectionKeys, HkdfPrf, Role, TrafficKeys, NONCE_LEN_12, TAG_LEN,
};
use crate::record::RecordHeader;
use crate::session::transform::{RecordOpener, RecordSealer, SessionTransform};

/// AEAD record protection (AES-256-GCM or ChaCha20-Poly1305).
pub struct AeadTransform {
    suite: CipherSuite,
    sealer: AeadSealer,
    opener: AeadOpener,
}

impl AeadTransform {
    pub fn new(suite: CipherSuite, keys: TrafficKeys) -> Result<Self, CryptoError> {
        Ok(Self {
            suite,
            sealer: AeadSealer(AeadHalf::new(suite, &keys.send)?),
            opener: AeadOpener(AeadHalf::new(suite, &keys.recv)?),
        })
    }

    /// Run the key schedule and build the transform in one go.
    pub fn derive(
        suite: CipherSuite,
        prf: HkdfPrf,
        secret: &[u8],
        salt: &[u8; SALT_LEN],
        role: Role,
    ) -> Result<Self, CryptoError> {
        let keys = derive_traffic_keys(secret, salt, suite, prf, role)?;
        tracing::debug!(
            suite = suite.name(),
            ?role,
            send = %keys.send.fingerprint(),
            recv = %keys.recv.fingerprint(),
            "derived traffic keys"
        );
        Self::new(suite, keys)
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }
}

impl SessionTransform for AeadTransform {
    type Sealer = AeadSealer;
    type Opener = AeadOpener;

    fn name(&self) -> &'static str {
        self.suite.name()
    }

    fn split(self) -> (AeadSealer, AeadOpener) {
        (self.sealer, self.opener)
    }
}

/// Cipher + IV for one direction; `None` once released.
struct AeadHalf {
    suite: CipherSuite,
    keyed: Option<(AeadImpl, Zeroizing<[u8; NONCE_LEN_12]>)>,
}

impl AeadHalf {
    fn new(suite: CipherSuite, keys: &DirectionKeys) -> Result<Self, CryptoError> {
        let aead = AeadImpl::from_suite_and_key(suite, &keys.key)?;
        Ok(Self {
            suite,
            keyed: Some((aead, Zeroizing::new(keys.iv))),
        })
    }

    fn keyed(&self) -> Result<(&AeadImpl, &[u8; NONCE_LEN_12]), CryptoError> {
        match &self.keyed {
            Some((aead, iv)) => Ok((aead, &**iv)),
            None => Err(CryptoError::Released),
        }
    }

    fn seal(&self, header: &RecordHeader, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (aead, iv) = self.keyed()?;
        // 1️⃣ AAD from immutable header fields
        let aad = build_aad(self.suite, header);
        // 2️⃣ Nonce from record sequence
        let nonce = derive_nonce_12_tls_style(iv, header.sequence)?;
        // 3️⃣ Seal
        aead.seal(&nonce, &aad, plaintext)
    }

    fn open(&self, header: &RecordHeader, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (aead, iv) = self.keyed()?;
        let aad = build_aad(self.suite, header);
        let nonce = derive_nonce_12_tls_style(iv, header.sequence)?;
        aead.open(&nonce, &aad, ciphertext)
    }
}

pub struct AeadSealer(AeadHalf);
pub struct AeadOpener(AeadHalf);

impl RecordSealer for AeadSealer {
    fn overhead(&self) -> usize {
        TAG_LEN
    }

    fn seal(&mut self, header: &RecordHeader, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.0.seal(header, plaintext)
    }

    fn release(&mut self) {
        self.0.keyed = None;
    }
}

impl RecordOpener for AeadOpener {
    fn overhead(&self) -> usize {
        TAG_LEN
    }

    fn open(&mut self, header: &RecordHeader, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.0.open(header, ciphertext)
    }

    fn release(&mut self) {
        self.0.keyed = None;
    }
}
