//! Network transports for talking to a NetSDR receiver.
//!
//! The device is driven over two channels:
//! - a TCP control channel carrying request/acknowledgement exchanges
//! - a UDP data channel carrying I/Q sample datagrams while streaming
//!
//! This is the lowest layer of the client. Both channels hand inbound bytes
//! to an [`InboundHandler`] registered by the owner; nothing here understands
//! the message format.

pub mod error;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use tcp::TcpControlTransport;
pub use traits::{inbound_channel, ControlTransport, DataTransport, InboundHandler, Mailbox};
pub use udp::UdpDataTransport;
