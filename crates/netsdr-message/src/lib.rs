//! NetSDR message codec.
//!
//! Every message on either channel starts with a 2-byte little-endian header:
//! - bits 15-13: message type
//! - bits 12-0: total message length, header included
//!
//! Data-item messages may be exactly 8192 bytes long, which does not fit in 13
//! bits; that length travels as the sentinel value 0.
//!
//! Pure functions only. No I/O, no state.

pub mod codec;
pub mod error;
pub mod hex;
pub mod samples;
pub mod types;

pub use codec::{
    decode_header, decode_message, encode_control_item_message, encode_data_item_message,
    encode_header, is_nak, DecodedMessage, MessageHeader, HEADER_SIZE, MAX_CONTROL_ITEM_LENGTH,
    MAX_DATA_ITEM_LENGTH, NAK,
};
pub use error::{MessageError, Result};
pub use hex::HexDump;
pub use samples::{decode_samples, Samples, MAX_SAMPLE_BITS};
pub use types::{ControlItemCode, MessageType};
