use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{ControlTransport, InboundHandler};

/// Largest single read from the control socket: one maximum-length message
/// plus its header.
const READ_BUFFER_SIZE: usize = 8194;

/// TCP control channel.
///
/// Each successful read from the socket is delivered to the registered
/// handler as-is. The device answers every request with exactly one message,
/// so no reassembly is attempted here.
pub struct TcpControlTransport {
    addr: String,
    handler: Option<InboundHandler>,
    writer: Option<OwnedWriteHalf>,
    alive: Arc<AtomicBool>,
    cancel: Option<CancellationToken>,
}

impl TcpControlTransport {
    /// Create a transport for the device control port, e.g. `"192.168.1.50:50000"`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            handler: None,
            writer: None,
            alive: Arc::new(AtomicBool::new(false)),
            cancel: None,
        }
    }

    /// The address this transport connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl ControlTransport for TcpControlTransport {
    fn register_inbound(&mut self, handler: InboundHandler) {
        self.handler = Some(handler);
    }

    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            info!(addr = %self.addr, "already connected");
            return Ok(());
        }

        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%err, "failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let cancel = CancellationToken::new();
        let alive = Arc::new(AtomicBool::new(true));

        tokio::spawn(read_loop(
            reader,
            self.handler.clone(),
            alive.clone(),
            cancel.clone(),
        ));

        self.writer = Some(writer);
        self.alive = alive;
        self.cancel = Some(cancel);

        info!(addr = %self.addr, "connected");
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.alive.store(false, Ordering::SeqCst);

        match self.writer.take() {
            Some(mut writer) => {
                if let Err(err) = writer.shutdown().await {
                    debug!(%err, "control socket shutdown failed");
                }
                info!(addr = %self.addr, "disconnected");
            }
            None => debug!("no active connection to disconnect"),
        }
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        writer.write_all(data).await?;
        writer.flush().await?;
        trace!(len = data.len(), "control message written");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some() && self.alive.load(Ordering::SeqCst)
    }
}

impl Drop for TcpControlTransport {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    handler: Option<InboundHandler>,
    alive: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    debug!("control listener started");
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read(&mut buf) => read,
        };

        match read {
            Ok(0) => {
                info!("control connection closed by peer");
                break;
            }
            Ok(n) => {
                let bytes = Bytes::copy_from_slice(&buf[..n]);
                match &handler {
                    Some(handler) => {
                        if !handler.deliver(bytes) {
                            debug!("inbound mailbox closed");
                            break;
                        }
                    }
                    None => debug!(len = n, "no inbound handler; dropping control message"),
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                error!(%err, "error in control receive loop");
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
    debug!("control listener stopped");
}
