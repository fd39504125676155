use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use netsdr_client::{FileSampleSink, ProtocolSession, SessionConfig};
use netsdr_transport::{TcpControlTransport, UdpDataTransport};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod capture;
pub mod run;
pub mod version;

/// Session wired to the real network transports.
pub type NetworkSession = ProtocolSession<TcpControlTransport, UdpDataTransport>;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a receiver interactively from stdin (C, D, F, S, Q).
    Run(RunArgs),
    /// Connect, tune, stream for a fixed time and print a summary.
    Capture(CaptureArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format).await,
        Command::Capture(args) => capture::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Receiver host.
    #[arg(long, env = "NETSDR_HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// Receiver control port.
    #[arg(long, env = "NETSDR_PORT", default_value = "50000")]
    pub port: u16,
    /// Local address to receive I/Q datagrams on.
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:60000")]
    pub data_bind: String,
    /// File the samples are written to. Truncated on every stream start.
    #[arg(long, short = 'o', default_value = "samples.bin")]
    pub output: PathBuf,
    /// I/Q output sample rate in Hz.
    #[arg(long, default_value = "100000")]
    pub sample_rate: u32,
    /// Width of one streamed sample in bits.
    #[arg(long, default_value = "16")]
    pub sample_bits: u32,
    /// Give up on an unanswered request after this long (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub request_timeout: Option<String>,
}

impl ConnectionArgs {
    pub fn device_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let request_timeout = self
            .request_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;
        Ok(SessionConfig {
            sample_rate_hz: self.sample_rate,
            sample_bits: self.sample_bits,
            request_timeout,
            ..SessionConfig::default()
        })
    }

    /// Build a disconnected session. Must run inside the tokio runtime.
    pub fn open_session(&self) -> CliResult<NetworkSession> {
        let config = self.session_config()?;
        Ok(ProtocolSession::new(
            TcpControlTransport::new(self.device_addr()),
            UdpDataTransport::new(self.data_bind.clone()),
            FileSampleSink::new(&self.output),
            config,
        ))
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Frequency in Hz the F key tunes to.
    #[arg(long, default_value = "20000000")]
    pub tune_frequency: u64,
    /// Receiver channel the F key tunes.
    #[arg(long, default_value = "1")]
    pub channel: u8,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Frequency to tune to, in Hz.
    #[arg(long, short = 'f')]
    pub frequency: u64,
    /// Receiver channel to tune.
    #[arg(long, default_value = "1")]
    pub channel: u8,
    /// How long to stream (e.g. 10s, 500ms). Ctrl-C stops early.
    #[arg(long, short = 'd', default_value = "10s")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
