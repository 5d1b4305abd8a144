use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Env var consulted for a filter directive when `--log-level` is absent.
pub const LOG_ENV: &str = "SCRIPTPIPE_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Pick the filter: explicit level, then `SCRIPTPIPE_LOG`, then `RUST_LOG`.
fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = level {
        return EnvFilter::new(level.as_directive());
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub fn init_logging(format: LogFormat, level: Option<LogLevel>) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
