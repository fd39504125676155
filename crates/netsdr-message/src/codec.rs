use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MessageError, Result};
use crate::types::{ControlItemCode, MessageType};

/// Header: type (3 bits) + length (13 bits), little-endian = 2 bytes.
pub const HEADER_SIZE: usize = 2;

/// Header plus the 2-byte code (control items) or sequence number (inbound data items).
const PREFIX_SIZE: usize = HEADER_SIZE + 2;

const TYPE_SHIFT: u16 = 13;
const LENGTH_MASK: u16 = 0x1FFF;

/// Largest total length of a control-item message.
pub const MAX_CONTROL_ITEM_LENGTH: usize = 8191;

/// Largest total length of a data-item message, sent as length field 0.
pub const MAX_DATA_ITEM_LENGTH: usize = 8192;

/// The device's negative acknowledgement: a bare header of length 2.
pub const NAK: [u8; 2] = [0x02, 0x00];

/// A decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_type: MessageType,
    /// Total message length including the header.
    pub length: usize,
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub message_type: MessageType,
    /// Control item code. Always [`ControlItemCode::None`] for data items.
    pub code: ControlItemCode,
    /// Data item sequence number. Always 0 for control items.
    pub sequence_number: u16,
    /// Parameters (control items) or samples (data items).
    pub body: Bytes,
}

/// Encode a message header.
///
/// Wire format:
/// ```text
/// ┌────────────────┬──────────────────────────┐
/// │ Type (3 bits)  │ Total length (13 bits)   │
/// │ bits 15-13     │ bits 12-0, 0 = 8192 for  │
/// │                │ data items               │
/// └────────────────┴──────────────────────────┘
///            stored as u16 little-endian
/// ```
pub fn encode_header(message_type: MessageType, total_length: usize) -> Result<[u8; 2]> {
    let max = if message_type.is_data_item() {
        MAX_DATA_ITEM_LENGTH
    } else {
        MAX_CONTROL_ITEM_LENGTH
    };
    if total_length > max {
        return Err(MessageError::LengthExceeded {
            length: total_length,
            max,
        });
    }

    let length_field = if total_length == MAX_DATA_ITEM_LENGTH {
        0
    } else {
        total_length as u16
    };
    let raw = (u16::from(message_type.bits()) << TYPE_SHIFT) | length_field;
    Ok(raw.to_le_bytes())
}

/// Decode a message header from the first two bytes of `bytes`.
pub fn decode_header(bytes: &[u8]) -> Result<MessageHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(MessageError::MalformedMessage(format!(
            "{} bytes is too short for a header",
            bytes.len()
        )));
    }

    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
    let message_type = MessageType::from_bits((raw >> TYPE_SHIFT) as u8);
    let mut length = usize::from(raw & LENGTH_MASK);
    if message_type.is_data_item() && length == 0 {
        length = MAX_DATA_ITEM_LENGTH;
    }

    Ok(MessageHeader {
        message_type,
        length,
    })
}

/// Encode a control-item message: header ++ code (i16 LE) ++ parameters.
pub fn encode_control_item_message(
    message_type: MessageType,
    code: ControlItemCode,
    parameters: &[u8],
) -> Result<Bytes> {
    let total = PREFIX_SIZE + parameters.len();
    let header = encode_header(message_type, total)?;

    let mut buf = BytesMut::with_capacity(total);
    buf.put_slice(&header);
    buf.put_i16_le(code.raw());
    buf.put_slice(parameters);
    Ok(buf.freeze())
}

/// Encode an outbound data-item message: header ++ parameters.
///
/// Outbound data items carry no sequence number.
pub fn encode_data_item_message(message_type: MessageType, parameters: &[u8]) -> Result<Bytes> {
    let total = HEADER_SIZE + parameters.len();
    let header = encode_header(message_type, total)?;

    let mut buf = BytesMut::with_capacity(total);
    buf.put_slice(&header);
    buf.put_slice(parameters);
    Ok(buf.freeze())
}

/// Decode a complete message.
///
/// The body is sliced out of `bytes` without copying. Bytes past the declared
/// length are ignored.
pub fn decode_message(bytes: Bytes) -> Result<DecodedMessage> {
    let header = decode_header(&bytes)?;

    if header.length < PREFIX_SIZE {
        return Err(MessageError::MalformedMessage(format!(
            "declared length {} is shorter than the {PREFIX_SIZE}-byte prefix",
            header.length
        )));
    }
    if bytes.len() < header.length {
        return Err(MessageError::MalformedMessage(format!(
            "header declares {} bytes, buffer holds {}",
            header.length,
            bytes.len()
        )));
    }

    let prefix = [bytes[2], bytes[3]];
    let body = bytes.slice(PREFIX_SIZE..header.length);

    if header.message_type.is_data_item() {
        Ok(DecodedMessage {
            message_type: header.message_type,
            code: ControlItemCode::None,
            sequence_number: u16::from_le_bytes(prefix),
            body,
        })
    } else {
        Ok(DecodedMessage {
            message_type: header.message_type,
            code: ControlItemCode::from_raw(i16::from_le_bytes(prefix)),
            sequence_number: 0,
            body,
        })
    }
}

/// Whether `bytes` is the device's negative acknowledgement.
pub fn is_nak(bytes: &[u8]) -> bool {
    bytes == NAK
}
