use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use netsdr_message::{decode_message, decode_samples, is_nak, HexDump, MessageError};
use netsdr_transport::{inbound_channel, ControlTransport, DataTransport, Mailbox};
use serde::Serialize;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::items::{self, ReceiverState};
use crate::sink::SampleSink;
use crate::stats::{SessionStats, StatsSnapshot};

/// Connection lifecycle of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Streaming,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    connection: ConnectionState,
    /// Set while `connect` runs its configuration exchanges.
    configuring: bool,
    /// Bumped by every `disconnect`; lets an in-flight `connect` notice it was cut short.
    epoch: u64,
    /// Correlation slot for the single outstanding control request.
    pending: Option<oneshot::Sender<Bytes>>,
}

impl SessionState {
    fn accepts_requests(&self) -> bool {
        self.connection != ConnectionState::Disconnected || self.configuring
    }
}

/// Client session for one NetSDR receiver.
///
/// The control channel is strictly half-duplex: every request waits for the
/// device's reply before the next one is written, and the reply is matched to
/// the request by position alone. Concurrent callers queue behind the request
/// in flight.
///
/// Inbound traffic from both transports lands in mailboxes drained by two
/// tasks spawned at construction, so [`ProtocolSession::new`] must be called
/// from within a tokio runtime.
pub struct ProtocolSession<C, D> {
    inner: Arc<Inner<C, D>>,
    pumps: [JoinHandle<()>; 2],
}

struct Inner<C, D> {
    config: SessionConfig,
    control: AsyncMutex<C>,
    data: AsyncMutex<D>,
    /// Held for a whole request/response exchange.
    exchange: AsyncMutex<()>,
    state: Mutex<SessionState>,
    sink: Mutex<Box<dyn SampleSink>>,
    stats: SessionStats,
}

impl<C, D> ProtocolSession<C, D>
where
    C: ControlTransport + 'static,
    D: DataTransport + 'static,
{
    /// Create a disconnected session that owns both transports and the sink.
    pub fn new(
        mut control: C,
        mut data: D,
        sink: impl SampleSink + 'static,
        config: SessionConfig,
    ) -> Self {
        let (control_handler, control_mailbox) = inbound_channel();
        let (data_handler, data_mailbox) = inbound_channel();
        control.register_inbound(control_handler);
        data.register_inbound(data_handler);

        let inner = Arc::new(Inner {
            config,
            control: AsyncMutex::new(control),
            data: AsyncMutex::new(data),
            exchange: AsyncMutex::new(()),
            state: Mutex::new(SessionState::default()),
            sink: Mutex::new(Box::new(sink)),
            stats: SessionStats::default(),
        });

        let pumps = [
            tokio::spawn(pump_control(inner.clone(), control_mailbox)),
            tokio::spawn(pump_data(inner.clone(), data_mailbox)),
        ];

        Self { inner, pumps }
    }

    /// Connect and push the receiver configuration.
    ///
    /// Does nothing when already connected. Sends sample rate, RF filter and
    /// A/D mode requests one after another, each acknowledged before the next.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Tear the session down from any state.
    ///
    /// Always closes the control transport, even when nothing is connected.
    /// A caller waiting on a reply is released with no response.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    /// Tune `channel` to `frequency_hz`. A logged no-op while disconnected.
    pub async fn change_frequency(&self, frequency_hz: u64, channel: u8) -> Result<()> {
        self.inner.change_frequency(frequency_hz, channel).await
    }

    /// Start I/Q acquisition. A logged no-op unless connected and idle.
    pub async fn start_iq(&self) -> Result<()> {
        self.inner.start_iq().await
    }

    /// Stop I/Q acquisition. A logged no-op unless streaming.
    pub async fn stop_iq(&self) -> Result<()> {
        self.inner.stop_iq().await
    }

    /// Feed one message from the control channel.
    pub fn on_tcp_message(&self, bytes: Bytes) {
        self.inner.on_tcp_message(bytes)
    }

    /// Feed one datagram from the data channel.
    pub fn on_udp_message(&self, bytes: Bytes) {
        self.inner.on_udp_message(bytes)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock_state().connection
    }

    /// Whether I/Q samples are being streamed.
    pub fn is_streaming(&self) -> bool {
        self.state() == ConnectionState::Streaming
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

impl<C, D> Drop for ProtocolSession<C, D> {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

impl<C, D> Inner<C, D>
where
    C: ControlTransport,
    D: DataTransport,
{
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sink(&self) -> MutexGuard<'_, Box<dyn SampleSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn connect(&self) -> Result<()> {
        let epoch = {
            let mut state = self.lock_state();
            if state.connection != ConnectionState::Disconnected {
                debug!(state = %state.connection, "already connected");
                return Ok(());
            }
            if state.configuring {
                debug!("connect already in progress");
                return Ok(());
            }
            state.configuring = true;
            state.epoch
        };

        let result = self.configure().await;

        let mut state = self.lock_state();
        if state.epoch != epoch {
            info!("connect interrupted by disconnect");
            return Ok(());
        }
        state.configuring = false;

        match result {
            Ok(true) => {
                state.connection = ConnectionState::Connected;
                info!("receiver connected and configured");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                warn!(%err, "connect failed");
                Err(err)
            }
        }
    }

    /// Returns `Ok(false)` when a request went unanswered because the session
    /// was torn down underneath it.
    async fn configure(&self) -> Result<bool> {
        self.control.lock().await.connect().await?;

        let requests = [
            items::sample_rate(self.config.sample_rate_hz)?,
            items::rf_filter(self.config.rf_filter_mode)?,
            items::ad_modes(self.config.ad_mode)?,
        ];
        for request in requests {
            if self.send_request(request).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn disconnect(&self) {
        let was_streaming = {
            let mut state = self.lock_state();
            let was_streaming = state.connection == ConnectionState::Streaming;
            state.connection = ConnectionState::Disconnected;
            state.configuring = false;
            state.epoch = state.epoch.wrapping_add(1);
            if state.pending.take().is_some() {
                debug!("pending request cancelled");
            }
            was_streaming
        };

        if was_streaming {
            self.halt_streaming(ConnectionState::Disconnected).await;
        }

        self.control.lock().await.disconnect().await;
        info!("session disconnected");
    }

    async fn change_frequency(&self, frequency_hz: u64, channel: u8) -> Result<()> {
        if self.lock_state().connection == ConnectionState::Disconnected {
            warn!(frequency_hz, channel, "no active connection; frequency not changed");
            return Ok(());
        }

        let request = items::receiver_frequency(channel, frequency_hz)?;
        if self.send_request(request).await?.is_some() {
            info!(frequency_hz, channel, "receiver tuned");
        }
        Ok(())
    }

    async fn start_iq(&self) -> Result<()> {
        let current = self.lock_state().connection;
        if current != ConnectionState::Connected {
            warn!(state = %current, "cannot start I/Q streaming");
            return Ok(());
        }
        // Surface a bad sample width here rather than on every datagram.
        decode_samples(self.config.sample_bits, &[])?;

        let request = items::receiver_state(ReceiverState::Start)?;
        let Some(reply) = self.send_request(request).await? else {
            return Ok(());
        };
        if is_nak(&reply) {
            warn!("device refused to start streaming");
            return Ok(());
        }

        // Held until the listener runs, so a concurrent stop cannot interleave.
        let mut data = self.data.lock().await;
        self.lock_sink().open().map_err(SessionError::Sink)?;
        {
            let mut state = self.lock_state();
            if state.connection != ConnectionState::Connected {
                debug!(state = %state.connection, "state changed while starting; not streaming");
                drop(state);
                self.close_sink();
                return Ok(());
            }
            state.connection = ConnectionState::Streaming;
        }

        if let Err(err) = data.start_receiving().await {
            {
                let mut state = self.lock_state();
                if state.connection == ConnectionState::Streaming {
                    state.connection = ConnectionState::Connected;
                }
            }
            self.close_sink();
            return Err(err.into());
        }
        if self.lock_state().connection != ConnectionState::Streaming {
            // Disconnected while the listener was starting.
            data.stop_receiving().await;
            self.close_sink();
            return Ok(());
        }

        info!("I/Q streaming started");
        Ok(())
    }

    async fn stop_iq(&self) -> Result<()> {
        let current = self.lock_state().connection;
        if current != ConnectionState::Streaming {
            warn!(state = %current, "I/Q streaming is not active");
            return Ok(());
        }

        let request = items::receiver_state(ReceiverState::Stop)?;
        let reply = self.send_request(request).await;

        let closed = self.halt_streaming(ConnectionState::Connected).await;
        info!("I/Q streaming stopped");

        reply?;
        closed.map_err(SessionError::Sink)
    }

    /// Leave Streaming for `next`, then stop the listener and close the sink.
    ///
    /// The state flips first: `ingest` re-checks it under the sink lock, so no
    /// datagram still in the mailbox can reach the sink once it is closed.
    async fn halt_streaming(&self, next: ConnectionState) -> io::Result<()> {
        let mut data = self.data.lock().await;
        {
            let mut state = self.lock_state();
            if state.connection == ConnectionState::Streaming {
                state.connection = next;
            }
        }
        data.stop_receiving().await;
        let closed = self.lock_sink().close();
        if let Err(err) = &closed {
            warn!(%err, "failed to close sample sink");
        }
        closed
    }

    fn close_sink(&self) {
        if let Err(err) = self.lock_sink().close() {
            warn!(%err, "failed to close sample sink");
        }
    }

    /// Send one control request and wait for the device's reply.
    ///
    /// Returns `Ok(None)` without touching the transport while disconnected,
    /// and when a disconnect cancels the wait.
    async fn send_request(&self, message: Bytes) -> Result<Option<Bytes>> {
        let _exchange = self.exchange.lock().await;

        let reply = {
            let mut state = self.lock_state();
            if !state.accepts_requests() {
                warn!("no active connection; request not sent");
                return Ok(None);
            }
            let (tx, rx) = oneshot::channel();
            state.pending = Some(tx);
            rx
        };

        debug!(request = %HexDump(&message), "sending request");
        let sent = self.control.lock().await.send(&message).await;
        if let Err(err) = sent {
            self.lock_state().pending = None;
            return Err(err.into());
        }
        SessionStats::bump(&self.stats.requests_sent);

        let outcome = match self.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, reply).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.lock_state().pending = None;
                    warn!(timeout = ?limit, "no response from device");
                    return Err(SessionError::Timeout(limit));
                }
            },
            None => reply.await,
        };

        match outcome {
            Ok(response) => {
                if is_nak(&response) {
                    warn!(request = %HexDump(&message), "device rejected request");
                }
                Ok(Some(response))
            }
            Err(_) => {
                debug!("request abandoned by disconnect");
                Ok(None)
            }
        }
    }

    fn on_tcp_message(&self, bytes: Bytes) {
        let pending = self.lock_state().pending.take();
        match pending {
            Some(reply) => {
                info!(response = %HexDump(&bytes), "response received");
                SessionStats::bump(&self.stats.responses_received);
                if reply.send(bytes).is_err() {
                    debug!("requester went away before the response arrived");
                }
            }
            None => {
                SessionStats::bump(&self.stats.unsolicited_responses);
                warn!(response = %HexDump(&bytes), "unsolicited response discarded");
            }
        }
    }

    fn on_udp_message(&self, bytes: Bytes) {
        if self.lock_state().connection != ConnectionState::Streaming {
            debug!(len = bytes.len(), "datagram outside a streaming session dropped");
            return;
        }

        SessionStats::bump(&self.stats.datagrams_received);
        if let Err(err) = self.ingest(bytes) {
            SessionStats::bump(&self.stats.malformed_datagrams);
            warn!(%err, "datagram dropped");
        }
    }

    fn ingest(&self, bytes: Bytes) -> Result<()> {
        let message = decode_message(bytes)?;
        if !message.message_type.is_data_item() {
            return Err(MessageError::MalformedMessage(format!(
                "expected a data item, got {}",
                message.message_type
            ))
            .into());
        }

        let samples = decode_samples(self.config.sample_bits, &message.body)?;
        let width = samples.sample_size();
        let count = samples.len();

        let mut out = Vec::with_capacity(count * width);
        for sample in samples {
            out.extend_from_slice(&sample.to_le_bytes()[..width]);
        }
        let mut sink = self.lock_sink();
        if self.lock_state().connection != ConnectionState::Streaming {
            debug!(samples = count, "streaming stopped; datagram dropped");
            return Ok(());
        }
        sink.append(&out).map_err(SessionError::Sink)?;
        drop(sink);

        SessionStats::add(&self.stats.samples_written, count as u64);
        SessionStats::add(&self.stats.bytes_written, out.len() as u64);
        trace!(
            sequence = message.sequence_number,
            samples = count,
            "datagram ingested"
        );
        Ok(())
    }
}

async fn pump_control<C, D>(inner: Arc<Inner<C, D>>, mut mailbox: Mailbox)
where
    C: ControlTransport,
    D: DataTransport,
{
    while let Some(bytes) = mailbox.recv().await {
        inner.on_tcp_message(bytes);
    }
}

async fn pump_data<C, D>(inner: Arc<Inner<C, D>>, mut mailbox: Mailbox)
where
    C: ControlTransport,
    D: DataTransport,
{
    while let Some(bytes) = mailbox.recv().await {
        inner.on_udp_message(bytes);
    }
}
