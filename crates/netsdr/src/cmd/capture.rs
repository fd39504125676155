use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cmd::{parse_duration, CaptureArgs, NetworkSession};
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_capture_summary, OutputFormat};

pub async fn run(args: CaptureArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let session = args.connection.open_session()?;

    let captured = capture(&session, &args, duration).await;
    session.disconnect().await;
    let elapsed = captured?;

    print_capture_summary(
        &args.connection.device_addr(),
        &args.connection.output,
        args.frequency,
        args.channel,
        elapsed,
        session.stats(),
        format,
    );
    Ok(SUCCESS)
}

/// Stream for `duration` or until Ctrl-C. Returns how long samples were collected.
async fn capture(
    session: &NetworkSession,
    args: &CaptureArgs,
    duration: Duration,
) -> CliResult<Duration> {
    session
        .connect()
        .await
        .map_err(|err| session_error("connect failed", err))?;
    session
        .change_frequency(args.frequency, args.channel)
        .await
        .map_err(|err| session_error("tune failed", err))?;
    session
        .start_iq()
        .await
        .map_err(|err| session_error("start failed", err))?;
    if !session.is_streaming() {
        return Err(CliError::new(
            FAILURE,
            format!("receiver did not start streaming (state: {})", session.state()),
        ));
    }

    let started = Instant::now();
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("capture interrupted"),
            Err(err) => warn!(%err, "failed to listen for Ctrl-C"),
        },
    }
    let elapsed = started.elapsed();

    session
        .stop_iq()
        .await
        .map_err(|err| session_error("stop failed", err))?;
    Ok(elapsed)
}
