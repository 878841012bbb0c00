//! Wire framing for secure sessions.
//!
//! Responsibilities:
//! - Define record headers and types
//! - Encode records into a canonical byte layout
//! - Decode records with strict validation
//!
//! Non-responsibilities:
//! - Cryptography
//! - IO
//! - Sequencing

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    RecordError,
    RecordHeader,
    RecordType,
    RecordView,
};
pub use encode::{encode_record, encode_record_into};
pub use decode::{decode_record, parse_record_header};
