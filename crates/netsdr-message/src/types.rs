//! Message types and control item codes.
//!
//! The 3-bit type field has eight values: four control-item forms exchanged
//! on the TCP channel and four data-item forms, one per stream index.

use std::fmt;

/// Message type carried in the top three bits of every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Host sets a control item / device reports an unsolicited change.
    SetControlItem,
    /// Host requests / device returns the current value of a control item.
    CurrentControlItem,
    /// Host requests / device returns the range of a control item.
    ControlItemRange,
    /// Acknowledgement of a data item.
    Ack,
    DataItem0,
    DataItem1,
    DataItem2,
    DataItem3,
}

impl MessageType {
    /// All types in wire order.
    pub const ALL: [MessageType; 8] = [
        MessageType::SetControlItem,
        MessageType::CurrentControlItem,
        MessageType::ControlItemRange,
        MessageType::Ack,
        MessageType::DataItem0,
        MessageType::DataItem1,
        MessageType::DataItem2,
        MessageType::DataItem3,
    ];

    /// Decode from the 3-bit header field. Higher bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[usize::from(bits & 0b111)]
    }

    /// The 3-bit header field value.
    pub fn bits(self) -> u8 {
        match self {
            MessageType::SetControlItem => 0,
            MessageType::CurrentControlItem => 1,
            MessageType::ControlItemRange => 2,
            MessageType::Ack => 3,
            MessageType::DataItem0 => 4,
            MessageType::DataItem1 => 5,
            MessageType::DataItem2 => 6,
            MessageType::DataItem3 => 7,
        }
    }

    /// True for the four data-item variants.
    pub fn is_data_item(self) -> bool {
        matches!(
            self,
            MessageType::DataItem0
                | MessageType::DataItem1
                | MessageType::DataItem2
                | MessageType::DataItem3
        )
    }

    /// True for the control-item variants.
    pub fn is_control_item(self) -> bool {
        !self.is_data_item()
    }

    /// Stream index of a data item (0-3), `None` for control items.
    pub fn data_item_index(self) -> Option<u8> {
        self.is_data_item().then(|| self.bits() - 4)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::SetControlItem => "SetControlItem",
            MessageType::CurrentControlItem => "CurrentControlItem",
            MessageType::ControlItemRange => "ControlItemRange",
            MessageType::Ack => "Ack",
            MessageType::DataItem0 => "DataItem0",
            MessageType::DataItem1 => "DataItem1",
            MessageType::DataItem2 => "DataItem2",
            MessageType::DataItem3 => "DataItem3",
        };
        f.write_str(name)
    }
}

/// Control item code, a signed 16-bit value following the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlItemCode {
    /// No code. Reported for data items, which carry a sequence number instead.
    None,
    /// Receiver run/stop state (0x0018).
    ReceiverState,
    /// Receiver tuning frequency (0x0020).
    ReceiverFrequency,
    /// RF filter selection (0x0044).
    RfFilter,
    /// A/D converter input modes (0x008A).
    AdModes,
    /// I/Q output sample rate (0x00B8).
    IqOutputDataSampleRate,
    /// Any code this client does not model.
    Other(i16),
}

impl ControlItemCode {
    /// Map a raw wire code. Unknown codes are preserved as [`ControlItemCode::Other`].
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            0x0000 => ControlItemCode::None,
            0x0018 => ControlItemCode::ReceiverState,
            0x0020 => ControlItemCode::ReceiverFrequency,
            0x0044 => ControlItemCode::RfFilter,
            0x008A => ControlItemCode::AdModes,
            0x00B8 => ControlItemCode::IqOutputDataSampleRate,
            other => ControlItemCode::Other(other),
        }
    }

    /// The raw wire code.
    pub fn raw(self) -> i16 {
        match self {
            ControlItemCode::None => 0x0000,
            ControlItemCode::ReceiverState => 0x0018,
            ControlItemCode::ReceiverFrequency => 0x0020,
            ControlItemCode::RfFilter => 0x0044,
            ControlItemCode::AdModes => 0x008A,
            ControlItemCode::IqOutputDataSampleRate => 0x00B8,
            ControlItemCode::Other(raw) => raw,
        }
    }
}
