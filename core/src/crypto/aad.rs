// ## 📂 File: `src/crypto/aad.rs`

use crate::crypto::types::CipherSuite;
use crate::record::types::{RecordHeader, RECORD_MAGIC, RECORD_VERSION};

/// Length of the AAD built for every record.
pub const AAD_LEN: usize = 4 // magic
    + 1                      // version
    + 1                      // record_type
    + 8                      // sequence
    + 4                      // plaintext_len
    + 2;                     // cipher suite id

/// AAD = record invariants known *before* encryption + the negotiated suite.
///
/// `ciphertext_len` is left out: it is only known after sealing and is
/// checked structurally by `RecordHeader::validate` instead.
#[inline]
pub fn build_aad(suite: CipherSuite, header: &RecordHeader) -> [u8; AAD_LEN] {
    let mut out = [0u8; AAD_LEN];
    let mut off = 0;

    out[off..off + 4].copy_from_slice(&RECORD_MAGIC);
    off += 4;
    out[off] = RECORD_VERSION;
    off += 1;
    out[off] = header.record_type.to_u8();
    off += 1;
    out[off..off + 8].copy_from_slice(&header.sequence.to_le_bytes());
    off += 8;
    out[off..off + 4].copy_from_slice(&header.plaintext_len.to_le_bytes());
    off += 4;
    out[off..off + 2].copy_from_slice(&suite.id().to_le_bytes());
    off += 2;

    debug_assert_eq!(off, AAD_LEN);
    out
}
