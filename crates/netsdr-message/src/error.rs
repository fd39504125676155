/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MessageError {
    /// The total message length does not fit the header's length field.
    #[error("message length exceeds allowed value ({length} bytes, max {max})")]
    LengthExceeded { length: usize, max: usize },

    /// The buffer is shorter than the header declares, or too short to hold one.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The requested sample width cannot be decoded into an integer sample.
    #[error("unsupported sample width: {0} bits")]
    UnsupportedSampleWidth(u32),
}

pub type Result<T> = std::result::Result<T, MessageError>;
