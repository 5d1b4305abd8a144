use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::Instant;

use tracing::{info, warn};

use crate::cmd::worker::Worker;
use crate::cmd::BatchArgs;
use crate::exit::{io_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_response, CommandStatus, OutputFormat};

pub fn run(args: BatchArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.exchange.timeout()?;
    let commands = match &args.file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            read_commands(BufReader::new(file))?
        }
        None => read_commands(io::stdin().lock())?,
    };

    if commands.is_empty() {
        info!("no commands to send");
        return Ok(SUCCESS);
    }

    let mut worker = Worker::connect(
        args.endpoints.resolve(),
        args.exchange.session_config(),
        timeout,
    )?;
    let mut any_failed = false;

    for command in &commands {
        let started = Instant::now();
        let response = worker.send(command)?;
        let status = CommandStatus::of(&response);
        print_response(command, &response, status, started.elapsed(), format);

        if status == CommandStatus::Failed {
            any_failed = true;
            if !args.keep_going {
                warn!(command = %command, "command failed, stopping batch");
                break;
            }
        }
    }

    worker.close()?;
    Ok(if any_failed { FAILURE } else { SUCCESS })
}

fn read_commands<R: BufRead>(reader: R) -> CliResult<Vec<String>> {
    let mut commands = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|err| io_error("failed reading commands", err))?;
        if let Some(command) = parse_command_line(&line) {
            commands.push(command.to_string());
        }
    }
    Ok(commands)
}

/// Blank lines and `#` comments are skipped; everything else is a command.
fn parse_command_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed)
    }
}
