use std::fmt;
use num_enum::TryFromPrimitive;

pub use crate::constants::{MAGIC_SSR1 as RECORD_MAGIC, RECORD_VERSION};

/// Record type identifiers.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum RecordType {
    Data  = 0x01,
    Close = 0x02,
}

impl RecordType {
    #[inline(always)]
    pub const fn try_from_u8(v: u8) -> Result<Self, RecordError> {
        match v {
            0x01 => Ok(RecordType::Data),
            0x02 => Ok(RecordType::Close),
            _ => Err(RecordError::InvalidRecordType(v)),
        }
    }

    /// Canonical wire encoding (1 byte).
    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Data => "data",
            RecordType::Close => "close",
        }
    }
}

/// Canonical record header (fixed size)
///
/// All fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub record_type: RecordType,
    pub sequence: u64,
    /// Plaintext length carried by this record (0 for CLOSE).
    pub plaintext_len: u32,
    /// Ciphertext bytes following the header, tag included.
    pub ciphertext_len: u32,
}

impl RecordHeader {
    pub const LEN: usize = 4  // magic
        + 1                  // version
        + 1                  // record_type
        + 8                  // sequence
        + 4                  // plaintext_len
        + 4;                 // ciphertext_len

    /// Header for a record that has not been sealed yet (`ciphertext_len` filled later).
    pub fn unsealed(record_type: RecordType, sequence: u64, plaintext_len: u32) -> Self {
        Self {
            record_type,
            sequence,
            plaintext_len,
            ciphertext_len: 0,
        }
    }

    /// Total encoded length of the record this header describes.
    #[inline]
    pub fn wire_len(&self) -> usize {
        Self::LEN + self.ciphertext_len as usize
    }

    /// Check the header against what the transform will accept.
    ///
    /// - `overhead`: bytes the transform adds to each record (AEAD tag)
    /// - `max_plaintext`: configured record size limit
    pub fn validate(&self, overhead: usize, max_plaintext: usize) -> Result<(), RecordError> {
        match self.record_type {
            RecordType::Data => {
                if self.plaintext_len == 0 {
                    return Err(RecordError::Malformed("DATA record cannot be empty".into()));
                }
            }
            RecordType::Close => {
                if self.plaintext_len != 0 {
                    return Err(RecordError::Malformed("CLOSE record must be empty".into()));
                }
            }
        }

        if self.plaintext_len as usize > max_plaintext {
            return Err(RecordError::Oversized {
                len: self.plaintext_len as usize,
                max: max_plaintext,
            });
        }

        let expected = self.plaintext_len as usize + overhead;
        if self.ciphertext_len as usize != expected {
            return Err(RecordError::LengthMismatch {
                expected,
                actual: self.ciphertext_len as usize,
            });
        }
        Ok(())
    }
}

/// Borrowed view over one decoded record.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub header: RecordHeader,
    pub ciphertext: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    InvalidMagic([u8; 4]),
    UnsupportedVersion(u8),
    InvalidRecordType(u8),
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    Oversized {
        len: usize,
        max: usize,
    },
    Truncated,
    Malformed(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RecordError::*;
        match self {
            InvalidMagic(m) =>
                write!(f, "invalid record magic: {:?}", m),
            UnsupportedVersion(v) =>
                write!(f, "unsupported record version: {}", v),
            InvalidRecordType(v) =>
                write!(f, "invalid record type: {}", v),
            LengthMismatch { expected, actual } =>
                write!(f, "length mismatch: expected {}, got {}", expected, actual),
            Oversized { len, max } =>
                write!(f, "record too large: {} > {}", len, max),
            Truncated =>
                write!(f, "truncated record"),
            Malformed(msg) =>
                write!(f, "malformed record: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}
