//! Transform contract plugged into `SecureSession`.
//!
//! A transform is split into a write half (`RecordSealer`) and a read half
//! (`RecordOpener`) so reads and writes can run concurrently without sharing
//! cipher state. The session owns framing, sequencing and I/O; the halves only
//! turn one record's payload into ciphertext and back.

use crate::crypto::CryptoError;
use crate::record::RecordHeader;

/// Encode half of a security transform.
pub trait RecordSealer: Send {
    /// Bytes added to every record payload (e.g. the AEAD tag).
    fn overhead(&self) -> usize;

    /// Seal `plaintext` for the record described by `header`.
    ///
    /// `header.ciphertext_len` is not set yet and must not be relied on.
    /// Must be deterministic for a given `(header, plaintext)` so a failed
    /// write can be resent byte-for-byte.
    fn seal(&mut self, header: &RecordHeader, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Drop key material. Later `seal` calls return `CryptoError::Released`.
    fn release(&mut self);
}

/// Decode half of a security transform.
pub trait RecordOpener: Send {
    fn overhead(&self) -> usize;

    /// Verify and decrypt one record. Authentication failure is
    /// `CryptoError::TagMismatch` and must yield no plaintext.
    fn open(&mut self, header: &RecordHeader, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn release(&mut self);
}

/// A complete security scheme: something that splits into both halves.
pub trait SessionTransform {
    type Sealer: RecordSealer;
    type Opener: RecordOpener;

    /// Stable scheme name for logs and telemetry.
    fn name(&self) -> &'static str;

    fn split(self) -> (Self::Sealer, Self::Opener);
}
