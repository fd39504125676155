/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] netsdr_transport::TransportError),

    /// Message encoding/decoding error.
    #[error("message error: {0}")]
    Message(#[from] netsdr_message::MessageError),

    /// The sample sink could not be opened or written.
    #[error("sample sink error: {0}")]
    Sink(std::io::Error),

    /// The device did not acknowledge a request in time.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, SessionError>;
