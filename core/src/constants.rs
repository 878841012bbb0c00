use std::time::Duration;

/// Magic number for the record layer.
/// "SSR1" = Secure Session Record v1
pub const MAGIC_SSR1: [u8; 4] = *b"SSR1";
pub const RECORD_VERSION: u8 = 1;

/// Read timeout value meaning "block indefinitely".
pub const NO_TIMEOUT: Duration = Duration::ZERO;

/// Write bound for the close notify record sent from `close()`.
pub const CLOSE_NOTIFY_TIMEOUT: Duration = Duration::from_millis(250);

/// Defaults when the config leaves a field out.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 16 * 1024; // 16 KiB, TLS-sized
/// Record size sanity bounds.
pub const MIN_RECORD_SIZE: usize = 1024;
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Shortest shared secret accepted from negotiation.
pub const MIN_SECRET_LEN: usize = 16;
/// Negotiated salt length.
pub const SALT_LEN: usize = 16;

/// Highest usable sequence number per direction.
pub const MAX_SEQUENCE: u64 = u64::MAX - 1;

/// Scratch size for a single transport read.
pub const READ_CHUNK: usize = 16 * 1024;

/// Protocol label bound into every derived key.
pub const KDF_LABEL: &[u8] = b"SSR1|session|traffic";

/// Cipher suite identifiers (bound into AAD and key schedule).
pub mod cipher_ids {
    pub const AES256_GCM: u16        = 0x0001;
    pub const CHACHA20_POLY1305: u16 = 0x0002;
}

/// HKDF PRF identifiers.
pub mod prf_ids {
    pub const SHA256: u16  = 0x0001;
    pub const SHA512: u16  = 0x0002;
    pub const BLAKE3K: u16 = 0x0003; // keyed BLAKE3 (avoid unless policy requires)
}
