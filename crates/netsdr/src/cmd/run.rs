use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cmd::RunArgs;
use crate::exit::{io_error, session_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};
use crate::processor::{CommandProcessor, Key};

pub async fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.connection.open_session()?;
    let device = args.connection.device_addr();
    let processor = CommandProcessor::new(&session, args.tune_frequency, args.channel);

    eprintln!("{}", Key::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|err| io_error("failed reading stdin", err))?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                None
            }
        };
        let Some(line) = line else { break };

        let Some(key) = Key::parse(&line) else {
            debug!(input = %line.trim(), "ignoring unknown command");
            continue;
        };

        match processor.handle(key).await {
            Ok(true) => print_status(
                session.state(),
                &device,
                &args.connection.output,
                session.stats(),
                format,
            ),
            Ok(false) => break,
            // A failed command leaves the prompt usable.
            Err(err) => eprintln!("error: {}", session_error("command failed", err)),
        }
    }

    session.disconnect().await;
    Ok(SUCCESS)
}
