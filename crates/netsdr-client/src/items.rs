//! Control item requests used by the session.
//!
//! Each builder returns a fully encoded SetControlItem message.

use bytes::Bytes;
use netsdr_message::{encode_control_item_message, ControlItemCode, MessageType, Result};
use tracing::warn;

/// Frequencies travel as 5-byte little-endian integers.
const FREQUENCY_BYTES: usize = 5;
const MAX_FREQUENCY_HZ: u64 = (1 << (8 * FREQUENCY_BYTES)) - 1;

/// Complex I/Q base-band data.
const IQ_DATA_MODE: u8 = 0x80;
const RUN: u8 = 0x02;
const IDLE: u8 = 0x01;
/// 16-bit contiguous capture.
const CAPTURE_MODE_16BIT: u8 = 0x01;
const BLOCK_COUNT: u8 = 1;

/// Run state requested through the ReceiverState control item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Start,
    Stop,
}

impl ReceiverState {
    fn parameters(self) -> [u8; 4] {
        match self {
            ReceiverState::Start => [IQ_DATA_MODE, RUN, CAPTURE_MODE_16BIT, BLOCK_COUNT],
            ReceiverState::Stop => [0x00, IDLE, 0x00, 0x00],
        }
    }
}

/// I/Q output sample rate.
pub fn sample_rate(rate_hz: u32) -> Result<Bytes> {
    set(
        ControlItemCode::IqOutputDataSampleRate,
        &u64::from(rate_hz).to_le_bytes()[..FREQUENCY_BYTES],
    )
}

/// RF filter selection, 0 = automatic.
pub fn rf_filter(mode: u16) -> Result<Bytes> {
    set(ControlItemCode::RfFilter, &mode.to_le_bytes())
}

/// A/D converter input modes.
pub fn ad_modes(mode: [u8; 2]) -> Result<Bytes> {
    set(ControlItemCode::AdModes, &mode)
}

/// Receiver tuning: channel byte followed by the frequency as 5-byte LE Hz.
///
/// Frequencies beyond 40 bits are truncated to the low 40 bits.
pub fn receiver_frequency(channel: u8, frequency_hz: u64) -> Result<Bytes> {
    if frequency_hz > MAX_FREQUENCY_HZ {
        warn!(
            frequency_hz,
            max = MAX_FREQUENCY_HZ,
            "frequency exceeds 40-bit field; truncating"
        );
    }
    let mut parameters = [0u8; 1 + FREQUENCY_BYTES];
    parameters[0] = channel;
    parameters[1..].copy_from_slice(&frequency_hz.to_le_bytes()[..FREQUENCY_BYTES]);
    set(ControlItemCode::ReceiverFrequency, &parameters)
}

/// Start or stop acquisition.
pub fn receiver_state(state: ReceiverState) -> Result<Bytes> {
    set(ControlItemCode::ReceiverState, &state.parameters())
}

fn set(code: ControlItemCode, parameters: &[u8]) -> Result<Bytes> {
    encode_control_item_message(MessageType::SetControlItem, code, parameters)
}
