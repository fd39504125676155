use std::fmt;
use std::io;

use netsdr_client::SessionError;
use netsdr_message::MessageError;
use netsdr_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { ref source, .. } | TransportError::Bind { ref source, .. } => {
            let code = io_error(context, io::Error::from(source.kind())).code;
            CliError::new(code, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::NotConnected => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    match err {
        MessageError::UnsupportedSampleWidth(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        MessageError::LengthExceeded { .. } | MessageError::MalformedMessage(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Message(err) => message_error(context, err),
        SessionError::Sink(source) => io_error(&format!("{context}: sample sink"), source),
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn refused_connection_is_a_transport_error() {
        let err = TransportError::Connect {
            addr: "127.0.0.1:50000".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let cli = session_error("connect failed", SessionError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("127.0.0.1:50000"));
    }

    #[test]
    fn session_errors_map_to_exit_codes() {
        assert_eq!(
            session_error("x", SessionError::Timeout(Duration::from_secs(1))).code,
            TIMEOUT
        );
        assert_eq!(
            session_error(
                "x",
                SessionError::Message(MessageError::UnsupportedSampleWidth(64))
            )
            .code,
            USAGE
        );
        assert_eq!(
            session_error(
                "x",
                SessionError::Message(MessageError::LengthExceeded {
                    length: 9000,
                    max: 8191
                })
            )
            .code,
            DATA_INVALID
        );
        assert_eq!(
            session_error(
                "x",
                SessionError::Sink(io::Error::from(io::ErrorKind::PermissionDenied))
            )
            .code,
            PERMISSION_DENIED
        );
        assert_eq!(
            transport_error("x", TransportError::NotConnected).code,
            TRANSPORT_ERROR
        );
    }
}
