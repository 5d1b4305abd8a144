use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use scriptpipe_frame::{FramerConfig, DEFAULT_MAX_RESPONSE};
use scriptpipe_session::SessionConfig;
use scriptpipe_transport::{Endpoints, LineTerminator, TransportConfig, DEFAULT_APP};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod batch;
pub mod doctor;
pub mod endpoints;
pub mod send;
pub mod version;
pub mod worker;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one or more commands and print each response.
    Send(SendArgs),
    /// Send commands read line by line from a file or stdin.
    Batch(BatchArgs),
    /// Show the resolved pipe addresses.
    Endpoints(EndpointsArgs),
    /// Check that the scripting pipes are present and usable.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Batch(args) => batch::run(args, format),
        Command::Endpoints(args) => endpoints::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the pipes live. Defaults to the platform addresses.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Pipe to write commands to (overrides the platform default).
    #[arg(long, env = "SCRIPTPIPE_TO_PIPE", value_name = "PATH", requires = "from_pipe")]
    pub to_pipe: Option<PathBuf>,
    /// Pipe to read responses from (overrides the platform default).
    #[arg(long, env = "SCRIPTPIPE_FROM_PIPE", value_name = "PATH", requires = "to_pipe")]
    pub from_pipe: Option<PathBuf>,
    /// Application name used in unix pipe names.
    #[arg(long, env = "SCRIPTPIPE_APP", default_value = DEFAULT_APP)]
    pub app: String,
    /// Terminate commands with CR+LF regardless of platform.
    #[arg(long)]
    pub crlf: bool,
}

impl EndpointArgs {
    pub fn resolve(&self) -> Endpoints {
        let resolved = Endpoints::resolve_for_app(&self.app);
        let terminator = if self.crlf {
            LineTerminator::CrLf
        } else {
            resolved.terminator()
        };

        match (&self.to_pipe, &self.from_pipe) {
            (Some(to), Some(from)) => Endpoints::new(to, from, terminator),
            _ => Endpoints::new(resolved.outbound(), resolved.inbound(), terminator),
        }
    }
}

/// Knobs for a command exchange.
#[derive(Args, Debug, Clone)]
pub struct ExchangeArgs {
    /// Give up if connecting or any single response takes longer (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,
    /// Maximum size of one response in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_RESPONSE)]
    pub max_response_size: usize,
}

impl ExchangeArgs {
    pub fn timeout(&self) -> CliResult<Option<Duration>> {
        self.timeout.as_deref().map(parse_duration).transpose()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            transport: TransportConfig::default(),
            framer: FramerConfig {
                max_response_len: self.max_response_size,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Commands to send, in order (e.g. "Help: Command=Help").
    #[arg(required = true, value_name = "COMMAND")]
    pub commands: Vec<String>,
    #[command(flatten)]
    pub endpoints: EndpointArgs,
    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Read commands from this file instead of stdin.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Keep going after a command reports failure.
    #[arg(long)]
    pub keep_going: bool,
    #[command(flatten)]
    pub endpoints: EndpointArgs,
    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

#[derive(Args, Debug)]
pub struct EndpointsArgs {
    #[command(flatten)]
    pub endpoints: EndpointArgs,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub endpoints: EndpointArgs,
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
