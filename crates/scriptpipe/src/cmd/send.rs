use std::time::Instant;

use tracing::info;

use crate::cmd::worker::Worker;
use crate::cmd::SendArgs;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::{print_response, CommandStatus, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.exchange.timeout()?;
    let endpoints = args.endpoints.resolve();
    info!(
        outbound = %endpoints.outbound().display(),
        inbound = %endpoints.inbound().display(),
        commands = args.commands.len(),
        "sending commands"
    );

    let mut worker = Worker::connect(endpoints, args.exchange.session_config(), timeout)?;
    let mut any_failed = false;

    for command in &args.commands {
        let started = Instant::now();
        let response = worker.send(command)?;
        let status = CommandStatus::of(&response);
        any_failed |= status == CommandStatus::Failed;
        print_response(command, &response, status, started.elapsed(), format);
    }

    worker.close()?;
    Ok(if any_failed { FAILURE } else { SUCCESS })
}
