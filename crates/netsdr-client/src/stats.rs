use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Session counters, updated from both the caller and the receive pumps.
#[derive(Debug, Default)]
pub(crate) struct SessionStats {
    pub(crate) requests_sent: AtomicU64,
    pub(crate) responses_received: AtomicU64,
    pub(crate) unsolicited_responses: AtomicU64,
    pub(crate) datagrams_received: AtomicU64,
    pub(crate) malformed_datagrams: AtomicU64,
    pub(crate) samples_written: AtomicU64,
    pub(crate) bytes_written: AtomicU64,
}

impl SessionStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            unsolicited_responses: self.unsolicited_responses.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            malformed_datagrams: self.malformed_datagrams.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Control requests written to the transport.
    pub requests_sent: u64,
    /// Responses matched to a pending request.
    pub responses_received: u64,
    /// Responses discarded because nothing was waiting.
    pub unsolicited_responses: u64,
    /// Datagrams handed to the session while streaming.
    pub datagrams_received: u64,
    /// Datagrams dropped because they failed to decode or persist.
    pub malformed_datagrams: u64,
    /// Samples appended to the sink.
    pub samples_written: u64,
    /// Bytes appended to the sink.
    pub bytes_written: u64,
}
