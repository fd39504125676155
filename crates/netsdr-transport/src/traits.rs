use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Receiving end of an inbound channel, owned by whoever registered the handler.
pub type Mailbox = mpsc::UnboundedReceiver<Bytes>;

/// Create a connected handler/mailbox pair.
pub fn inbound_channel() -> (InboundHandler, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboundHandler { tx }, rx)
}

/// Handle a transport uses to deliver inbound bytes to its owner.
///
/// Delivery never blocks the caller: receive loops push into an unbounded
/// mailbox and go straight back to the socket. The mailbox is the only buffer
/// between the socket and the consumer, so a consumer that stays slower than
/// the device lets it grow; a datagram is never dropped here.
#[derive(Debug, Clone)]
pub struct InboundHandler {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl InboundHandler {
    /// Deliver one inbound message.
    ///
    /// Returns `false` once the owner has dropped its mailbox.
    pub fn deliver(&self, bytes: Bytes) -> bool {
        self.tx.send(bytes).is_ok()
    }

    /// Whether the owning mailbox has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Request/acknowledgement channel to the device (TCP in practice).
#[async_trait]
pub trait ControlTransport: Send {
    /// Register where inbound messages are delivered. Replaces any earlier handler.
    fn register_inbound(&mut self, handler: InboundHandler);

    /// Open the channel. Connecting an already connected transport is a no-op.
    async fn connect(&mut self) -> Result<()>;

    /// Close the channel. Safe to call when nothing is connected.
    async fn disconnect(&mut self);

    /// Write one complete message.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Whether the channel is currently usable.
    fn is_connected(&self) -> bool;
}

/// Inbound datagram channel from the device (UDP in practice).
#[async_trait]
pub trait DataTransport: Send {
    /// Register where inbound datagrams are delivered. Replaces any earlier handler.
    fn register_inbound(&mut self, handler: InboundHandler);

    /// Start the receive loop. Starting twice is a no-op.
    async fn start_receiving(&mut self) -> Result<()>;

    /// Stop the receive loop and release the socket. Safe to call when idle.
    async fn stop_receiving(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_bytes_arrive_in_order() {
        let (handler, mut mailbox) = inbound_channel();
        assert!(handler.deliver(Bytes::from_static(b"one")));
        assert!(handler.deliver(Bytes::from_static(b"two")));

        assert_eq!(mailbox.try_recv().unwrap().as_ref(), b"one");
        assert_eq!(mailbox.try_recv().unwrap().as_ref(), b"two");
        assert!(mailbox.try_recv().is_err());
    }

    #[test]
    fn backlog_is_kept_while_the_owner_is_not_reading() {
        let (handler, mut mailbox) = inbound_channel();
        for i in 0..10_000u32 {
            assert!(handler.deliver(Bytes::copy_from_slice(&i.to_le_bytes())));
        }

        for i in 0..10_000u32 {
            assert_eq!(mailbox.try_recv().unwrap().as_ref(), &i.to_le_bytes());
        }
        assert!(mailbox.try_recv().is_err());
    }

    #[test]
    fn deliver_reports_dropped_mailbox() {
        let (handler, mailbox) = inbound_channel();
        drop(mailbox);
        assert!(handler.is_closed());
        assert!(!handler.deliver(Bytes::from_static(b"late")));
    }
}
