use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive when set.
pub const LOG_ENV: &str = "NETSDR_LOG";

/// Workspace crates that log at the requested level. Everything else
/// (tokio, mio) is capped at warn.
const NETSDR_TARGETS: [&str; 4] = [
    "netsdr",
    "netsdr_client",
    "netsdr_message",
    "netsdr_transport",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives for `level`, e.g. `warn,netsdr=debug,netsdr_client=debug,..`.
pub fn directives(level: LogLevel) -> String {
    let mut out = level.min(LogLevel::Warn).directive().to_string();
    for target in NETSDR_TARGETS {
        out.push(',');
        out.push_str(target);
        out.push('=');
        out.push_str(level.directive());
    }
    out
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directives(level)));
    // Targets only help once library internals are on screen.
    let show_target = level >= LogLevel::Debug;

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(show_target);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_levels_stay_scoped_to_netsdr_crates() {
        assert_eq!(
            directives(LogLevel::Trace),
            "warn,netsdr=trace,netsdr_client=trace,netsdr_message=trace,netsdr_transport=trace"
        );
    }

    #[test]
    fn quiet_levels_also_quiet_dependencies() {
        assert_eq!(
            directives(LogLevel::Error),
            "error,netsdr=error,netsdr_client=error,netsdr_message=error,netsdr_transport=error"
        );
    }

    #[test]
    fn directives_parse_as_a_filter() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
            assert!(EnvFilter::try_new(directives(level)).is_ok());
        }
    }
}
