//! Client for NetSDR software-defined-radio receivers.
//!
//! # Crate Structure
//!
//! - [`transport`]: control and data channel abstractions with tokio TCP/UDP implementations
//! - [`message`]: the binary wire codec and sample decoding
//! - [`client`]: the receiver session, sample sinks and control item builders

/// Re-export transport types.
pub mod transport {
    pub use netsdr_transport::*;
}

/// Re-export codec types.
pub mod message {
    pub use netsdr_message::*;
}

/// Re-export session types.
pub mod client {
    pub use netsdr_client::*;
}
