use std::io::ErrorKind;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{DataTransport, InboundHandler};

/// Largest datagram the device emits is one maximum-length data item.
const DATAGRAM_BUFFER_SIZE: usize = 8192;

/// UDP listener for I/Q sample datagrams.
///
/// The socket is bound when receiving starts and released when it stops, so
/// the port is only held while the device is streaming.
pub struct UdpDataTransport {
    bind_addr: String,
    handler: Option<InboundHandler>,
    local_addr: Option<SocketAddr>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl UdpDataTransport {
    /// Create a transport that listens on `bind_addr`, e.g. `"0.0.0.0:60000"`.
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            handler: None,
            local_addr: None,
            cancel: None,
            task: None,
        }
    }

    /// The bound address while receiving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Whether the receive loop is running.
    pub fn is_receiving(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[async_trait]
impl DataTransport for UdpDataTransport {
    fn register_inbound(&mut self, handler: InboundHandler) {
        self.handler = Some(handler);
    }

    async fn start_receiving(&mut self) -> Result<()> {
        if self.is_receiving() {
            debug!(addr = ?self.local_addr, "already receiving");
            return Ok(());
        }

        let socket = UdpSocket::bind(&self.bind_addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;
        let local_addr = socket.local_addr()?;
        let cancel = CancellationToken::new();

        let task = tokio::spawn(receive_loop(socket, self.handler.clone(), cancel.clone()));

        self.local_addr = Some(local_addr);
        self.cancel = Some(cancel);
        self.task = Some(task);
        info!(addr = %local_addr, "listening for sample datagrams");
        Ok(())
    }

    async fn stop_receiving(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            debug!(addr = ?self.local_addr, "stopping datagram listener");
        }
        // The socket is released when the loop returns.
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.local_addr = None;
    }
}

impl Drop for UdpDataTransport {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    handler: Option<InboundHandler>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; DATAGRAM_BUFFER_SIZE];

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => received,
        };

        match received {
            Ok((n, _from)) => {
                let datagram = Bytes::copy_from_slice(&buf[..n]);
                match &handler {
                    Some(handler) => {
                        if !handler.deliver(datagram) {
                            debug!("inbound mailbox closed");
                            break;
                        }
                    }
                    None => warn!(len = n, "no inbound handler; dropping datagram"),
                }
            }
            // ICMP port-unreachable surfaces as a reset on some platforms.
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::ConnectionReset) => {
                continue
            }
            Err(err) => {
                error!(%err, "error in datagram receive loop");
                break;
            }
        }
    }

    info!("datagram listener stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::traits::inbound_channel;

    #[tokio::test]
    async fn receives_datagrams_in_order() {
        let (handler, mut mailbox) = inbound_channel();
        let mut transport = UdpDataTransport::new("127.0.0.1:0");
        transport.register_inbound(handler);

        transport.start_receiving().await.unwrap();
        let target = transport.local_addr().expect("bound while receiving");

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"first", target).await.unwrap();
        sender.send_to(b"second", target).await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), mailbox.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), mailbox.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.as_ref(), b"first");
        assert_eq!(second.as_ref(), b"second");

        transport.stop_receiving().await;
        assert!(!transport.is_receiving());
        assert!(transport.local_addr().is_none());
    }

    #[tokio::test]
    async fn start_twice_keeps_first_socket() {
        let mut transport = UdpDataTransport::new("127.0.0.1:0");
        transport.start_receiving().await.unwrap();
        let first = transport.local_addr();

        transport.start_receiving().await.unwrap();
        assert_eq!(transport.local_addr(), first);

        transport.stop_receiving().await;
    }

    #[tokio::test]
    async fn stop_releases_the_port() {
        let mut transport = UdpDataTransport::new("127.0.0.1:0");
        transport.start_receiving().await.unwrap();
        let bound = transport.local_addr().unwrap();
        transport.stop_receiving().await;

        let mut again = UdpDataTransport::new(bound.to_string());
        again.start_receiving().await.unwrap();
        assert_eq!(again.local_addr(), Some(bound));
        again.stop_receiving().await;
    }

    #[tokio::test]
    async fn stop_when_idle_is_safe() {
        let mut transport = UdpDataTransport::new("127.0.0.1:0");
        transport.stop_receiving().await;
        assert!(!transport.is_receiving());
    }

    #[tokio::test]
    async fn bind_failure_reports_address() {
        let mut transport = UdpDataTransport::new("not-an-address");
        let err = transport.start_receiving().await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
