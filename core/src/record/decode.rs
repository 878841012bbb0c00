use byteorder::{ByteOrder, LittleEndian};

use crate::record::types::{RecordError, RecordHeader, RecordType, RecordView, RECORD_MAGIC, RECORD_VERSION};

#[inline]
pub fn parse_record_header(wire: &[u8]) -> Result<RecordHeader, RecordError> {
    if wire.len() < RecordHeader::LEN {
        return Err(RecordError::Truncated);
    }

    // --- fixed offsets ---
    let mut off = 0;

    let magic = &wire[off..off + 4];
    off += 4;
    if magic != RECORD_MAGIC {
        let mut m = [0u8; 4];
        m.copy_from_slice(magic);
        return Err(RecordError::InvalidMagic(m));
    }

    let version = wire[off];
    off += 1;
    if version != RECORD_VERSION {
        return Err(RecordError::UnsupportedVersion(version));
    }

    let record_type = RecordType::try_from_u8(wire[off])?;
    off += 1;

    let sequence = LittleEndian::read_u64(&wire[off..off + 8]);
    off += 8;

    let plaintext_len = LittleEndian::read_u32(&wire[off..off + 4]);
    off += 4;

    let ciphertext_len = LittleEndian::read_u32(&wire[off..off + 4]);

    Ok(RecordHeader {
        record_type,
        sequence,
        plaintext_len,
        ciphertext_len,
    })
}

/// Decode a single record from bytes.
///
/// Caller guarantees:
/// - Full record bytes are provided (no trailing bytes)
/// - Sequence checks happen in the session layer
pub fn decode_record(wire: &[u8]) -> Result<RecordView<'_>, RecordError> {
    let header = parse_record_header(wire)?;

    let expected_len = header.wire_len();
    if wire.len() < expected_len {
        return Err(RecordError::Truncated);
    }
    if wire.len() != expected_len {
        return Err(RecordError::LengthMismatch {
            expected: expected_len,
            actual: wire.len(),
        });
    }

    Ok(RecordView {
        header,
        ciphertext: &wire[RecordHeader::LEN..expected_len],
    })
}
