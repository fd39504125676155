use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use netsdr_client::{ConnectionState, StatsSnapshot};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    state: ConnectionState,
    device: &'a str,
    output: String,
    #[serde(flatten)]
    stats: StatsSnapshot,
}

#[derive(Serialize)]
struct CaptureOutput<'a> {
    device: &'a str,
    output: String,
    frequency_hz: u64,
    channel: u8,
    duration_ms: u128,
    #[serde(flatten)]
    stats: StatsSnapshot,
}

/// Session status after an interactive command.
pub fn print_status(
    state: ConnectionState,
    device: &str,
    output: &Path,
    stats: StatsSnapshot,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = StatusOutput {
                state,
                device,
                output: output.display().to_string(),
                stats,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut rows = vec![
                ("state", state.to_string()),
                ("device", device.to_string()),
                ("output", output.display().to_string()),
            ];
            rows.extend(stats_rows(&stats));
            println!("{}", key_value_table(rows));
        }
        OutputFormat::Pretty => {
            println!(
                "state={state} device={device} requests={} responses={} datagrams={} samples={}",
                stats.requests_sent,
                stats.responses_received,
                stats.datagrams_received,
                stats.samples_written
            );
        }
    }
}

/// Summary printed once a timed capture has finished.
pub fn print_capture_summary(
    device: &str,
    output: &Path,
    frequency_hz: u64,
    channel: u8,
    elapsed: Duration,
    stats: StatsSnapshot,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = CaptureOutput {
                device,
                output: output.display().to_string(),
                frequency_hz,
                channel,
                duration_ms: elapsed.as_millis(),
                stats,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut rows = vec![
                ("device", device.to_string()),
                ("output", output.display().to_string()),
                ("frequency_hz", frequency_hz.to_string()),
                ("channel", channel.to_string()),
                ("duration", format!("{:.3}s", elapsed.as_secs_f64())),
            ];
            rows.extend(stats_rows(&stats));
            println!("{}", key_value_table(rows));
        }
        OutputFormat::Pretty => {
            println!(
                "captured {} samples ({} bytes) at {frequency_hz} Hz in {:.3}s -> {}",
                stats.samples_written,
                stats.bytes_written,
                elapsed.as_secs_f64(),
                output.display()
            );
            if stats.malformed_datagrams > 0 {
                println!("dropped {} malformed datagrams", stats.malformed_datagrams);
            }
        }
    }
}

fn stats_rows(stats: &StatsSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("requests_sent", stats.requests_sent.to_string()),
        ("responses_received", stats.responses_received.to_string()),
        (
            "unsolicited_responses",
            stats.unsolicited_responses.to_string(),
        ),
        ("datagrams_received", stats.datagrams_received.to_string()),
        ("malformed_datagrams", stats.malformed_datagrams.to_string()),
        ("samples_written", stats.samples_written.to_string()),
        ("bytes_written", stats.bytes_written.to_string()),
    ]
}

fn key_value_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}
