use netsdr_client::{ProtocolSession, Result};
use netsdr_transport::{ControlTransport, DataTransport};

/// Console command, taken from the first character of an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Connect,
    Disconnect,
    Tune,
    /// Start streaming, or stop it when already streaming.
    Toggle,
    Quit,
}

impl Key {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_start().chars().next()?.to_ascii_uppercase() {
            'C' => Some(Key::Connect),
            'D' => Some(Key::Disconnect),
            'F' => Some(Key::Tune),
            'S' => Some(Key::Toggle),
            'Q' => Some(Key::Quit),
            _ => None,
        }
    }

    pub const HELP: &'static str =
        "keys: C connect, D disconnect, F tune, S start/stop streaming, Q quit";
}

/// Maps console keys onto session operations.
pub struct CommandProcessor<'a, C, D> {
    session: &'a ProtocolSession<C, D>,
    frequency_hz: u64,
    channel: u8,
}

impl<'a, C, D> CommandProcessor<'a, C, D>
where
    C: ControlTransport + 'static,
    D: DataTransport + 'static,
{
    pub fn new(session: &'a ProtocolSession<C, D>, frequency_hz: u64, channel: u8) -> Self {
        Self {
            session,
            frequency_hz,
            channel,
        }
    }

    /// Run the operation bound to `key`. Returns `false` once the user quits.
    pub async fn handle(&self, key: Key) -> Result<bool> {
        match key {
            Key::Connect => self.session.connect().await?,
            Key::Disconnect => self.session.disconnect().await,
            Key::Tune => {
                self.session
                    .change_frequency(self.frequency_hz, self.channel)
                    .await?
            }
            Key::Toggle => {
                if self.session.is_streaming() {
                    self.session.stop_iq().await?
                } else {
                    self.session.start_iq().await?
                }
            }
            Key::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use netsdr_client::{ConnectionState, FileSampleSink, SessionConfig};
    use netsdr_transport::{TcpControlTransport, UdpDataTransport};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn unique_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "netsdr-processor-{tag}-{}-{}.bin",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ))
    }

    /// Device stand-in that acknowledges every control item by echoing it.
    async fn spawn_echo_device() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 8194];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if stream.write_all(&buf[..n]).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });
        addr
    }

    #[test]
    fn keys_parse_case_insensitively() {
        assert_eq!(Key::parse("c"), Some(Key::Connect));
        assert_eq!(Key::parse("D"), Some(Key::Disconnect));
        assert_eq!(Key::parse("f\n"), Some(Key::Tune));
        assert_eq!(Key::parse("  s"), Some(Key::Toggle));
        assert_eq!(Key::parse("quit"), Some(Key::Quit));
    }

    #[test]
    fn unknown_input_is_ignored() {
        assert_eq!(Key::parse(""), None);
        assert_eq!(Key::parse("   "), None);
        assert_eq!(Key::parse("x"), None);
        assert_eq!(Key::parse("?"), None);
    }

    #[tokio::test]
    async fn keys_drive_a_session_through_its_lifecycle() {
        let device = spawn_echo_device().await;
        let output = unique_path("lifecycle");
        let session = ProtocolSession::new(
            TcpControlTransport::new(device),
            UdpDataTransport::new("127.0.0.1:0"),
            FileSampleSink::new(&output),
            SessionConfig::default(),
        );
        let processor = CommandProcessor::new(&session, 20_000_000, 1);

        assert!(processor.handle(Key::Connect).await.unwrap());
        assert_eq!(session.state(), ConnectionState::Connected);

        assert!(processor.handle(Key::Tune).await.unwrap());

        assert!(processor.handle(Key::Toggle).await.unwrap());
        assert_eq!(session.state(), ConnectionState::Streaming);
        assert!(output.exists());

        assert!(processor.handle(Key::Toggle).await.unwrap());
        assert_eq!(session.state(), ConnectionState::Connected);

        assert!(processor.handle(Key::Disconnect).await.unwrap());
        assert_eq!(session.state(), ConnectionState::Disconnected);

        assert!(!processor.handle(Key::Quit).await.unwrap());
        assert_eq!(session.stats().requests_sent, 6);

        let _ = std::fs::remove_file(&output);
    }

    #[tokio::test]
    async fn keys_before_connect_change_nothing() {
        let output = unique_path("idle");
        let session = ProtocolSession::new(
            TcpControlTransport::new("127.0.0.1:9"),
            UdpDataTransport::new("127.0.0.1:0"),
            FileSampleSink::new(&output),
            SessionConfig::default(),
        );
        let processor = CommandProcessor::new(&session, 20_000_000, 1);

        assert!(processor.handle(Key::Tune).await.unwrap());
        assert!(processor.handle(Key::Toggle).await.unwrap());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.stats().requests_sent, 0);
        assert!(!output.exists());
    }
}
