mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "scriptpipe",
    version,
    about = "Drive Audacity through mod-script-pipe"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr); falls back to SCRIPTPIPE_LOG, then RUST_LOG.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_multiple_commands() {
        let cli = Cli::try_parse_from([
            "scriptpipe",
            "send",
            "Help: Command=Help",
            "SelectAll:",
            "--timeout",
            "5s",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.commands.len(), 2);
        assert_eq!(args.exchange.timeout.as_deref(), Some("5s"));
    }

    #[test]
    fn send_requires_a_command() {
        let err = Cli::try_parse_from(["scriptpipe", "send"])
            .expect_err("missing command should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn pipe_overrides_come_in_pairs() {
        let err = Cli::try_parse_from([
            "scriptpipe",
            "endpoints",
            "--to-pipe",
            "/tmp/only.to",
        ])
        .expect_err("lone override should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn parses_batch_with_global_format() {
        let cli = Cli::try_parse_from([
            "scriptpipe",
            "batch",
            "--file",
            "commands.txt",
            "--keep-going",
            "--format",
            "json",
        ])
        .expect("batch args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert!(args.keep_going);
    }
}
