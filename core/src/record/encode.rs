use byteorder::{LittleEndian, WriteBytesExt};

use crate::record::types::{RecordError, RecordHeader, RECORD_MAGIC, RECORD_VERSION};

/// Append one record in canonical wire format to `out`.
///
/// Layout:
///
/// ```text
/// [ magic (4) ]
/// [ version (1) ]
/// [ record_type (1) ]
/// [ sequence (8) ]
/// [ plaintext_len (4) ]
/// [ ciphertext_len (4) ]
/// [ ciphertext (N) ]
/// ```
pub fn encode_record_into(
    out: &mut Vec<u8>,
    header: &RecordHeader,
    ciphertext: &[u8],
) -> Result<(), RecordError> {
    if ciphertext.len() != header.ciphertext_len as usize {
        return Err(RecordError::LengthMismatch {
            expected: header.ciphertext_len as usize,
            actual: ciphertext.len(),
        });
    }

    out.reserve(header.wire_len());

    // --- Header ---
    out.extend_from_slice(&RECORD_MAGIC);
    out.push(RECORD_VERSION);
    out.push(header.record_type.to_u8());

    // Writing into a Vec cannot fail.
    let _ = out.write_u64::<LittleEndian>(header.sequence);
    let _ = out.write_u32::<LittleEndian>(header.plaintext_len);
    let _ = out.write_u32::<LittleEndian>(header.ciphertext_len);

    // --- Body ---
    out.extend_from_slice(ciphertext);
    Ok(())
}

/// Encode a single record into a fresh buffer.
pub fn encode_record(header: &RecordHeader, ciphertext: &[u8]) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::with_capacity(header.wire_len());
    encode_record_into(&mut out, header, ciphertext)?;
    Ok(out)
}
