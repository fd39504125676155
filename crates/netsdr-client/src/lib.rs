//! NetSDR receiver session management.
//!
//! This is the "just works" layer. Connect to a receiver, tune it, and stream
//! I/Q samples into a sink, with the control channel's single-outstanding
//! request discipline handled for you.

pub mod config;
pub mod error;
pub mod items;
pub mod session;
pub mod sink;
pub mod stats;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use items::ReceiverState;
pub use session::{ConnectionState, ProtocolSession};
pub use sink::{FileSampleSink, SampleSink};
pub use stats::StatsSnapshot;
