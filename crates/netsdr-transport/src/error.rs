/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the device control port.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to bind the local datagram socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on an established channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation needs a live connection and there is none.
    #[error("not connected to a device")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
