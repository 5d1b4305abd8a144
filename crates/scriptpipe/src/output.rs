use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Marker the scripting module appends to every successful response.
const FINISHED_OK: &str = "BatchCommand finished: OK";
/// Marker for a command the peer rejected or failed to run.
const FINISHED_FAILED: &str = "BatchCommand finished: Failed";

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Raw
        }
    }
}

/// Outcome reported by the peer's completion marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Ok,
    Failed,
    Unknown,
}

impl CommandStatus {
    pub fn of(response: &str) -> Self {
        if response.contains(FINISHED_FAILED) {
            Self::Failed
        } else if response.contains(FINISHED_OK) {
            Self::Ok
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    command: &'a str,
    status: CommandStatus,
    response: &'a str,
    response_size: usize,
    elapsed_ms: u128,
}

pub fn print_response(
    command: &str,
    response: &str,
    status: CommandStatus,
    elapsed: Duration,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                command,
                status,
                response,
                response_size: response.len(),
                elapsed_ms: elapsed.as_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "STATUS", "MS", "RESPONSE"])
                .add_row(vec![
                    command.to_string(),
                    status.as_str().to_string(),
                    elapsed.as_millis().to_string(),
                    response.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(">>> {command}");
            println!("{response}");
            println!(
                "<<< status={} size={} elapsed={}ms",
                status.as_str(),
                response.len(),
                elapsed.as_millis()
            );
        }
        OutputFormat::Raw => {
            print_raw(response.as_bytes());
            print_raw(b"\n");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
