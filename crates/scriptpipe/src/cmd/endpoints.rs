use std::path::Path;

use comfy_table::{presets::UTF8_FULL, Table};
use scriptpipe_transport::{ChannelRole, Endpoints};
use serde::Serialize;

use crate::cmd::EndpointsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
struct ChannelInfo {
    role: String,
    path: String,
    exists: bool,
}

#[derive(Debug, Serialize)]
struct EndpointsOutput {
    terminator: &'static str,
    channels: Vec<ChannelInfo>,
}

pub fn run(args: EndpointsArgs, format: OutputFormat) -> CliResult<i32> {
    let output = describe(&args.endpoints.resolve());
    print_endpoints(&output, format);
    Ok(SUCCESS)
}

fn describe(endpoints: &Endpoints) -> EndpointsOutput {
    let channels = [ChannelRole::Outbound, ChannelRole::Inbound]
        .into_iter()
        .map(|role| {
            let path = endpoints.path(role);
            ChannelInfo {
                role: role.to_string(),
                path: path.display().to_string(),
                exists: exists(path),
            }
        })
        .collect();

    EndpointsOutput {
        terminator: endpoints.terminator().name(),
        channels,
    }
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

fn print_endpoints(output: &EndpointsOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["ROLE", "PATH", "EXISTS"]);
            for c in &output.channels {
                table.add_row(vec![c.role.clone(), c.path.clone(), c.exists.to_string()]);
            }
            println!("{table}");
            println!("terminator: {}", output.terminator);
        }
        OutputFormat::Pretty => {
            println!("scriptpipe endpoints\n");
            for c in &output.channels {
                let state = if c.exists { "present" } else { "missing" };
                println!("  {:<9} {} ({state})", c.role, c.path);
            }
            println!("  {:<9} {}", "line end", output.terminator);
        }
        OutputFormat::Raw => {
            for c in &output.channels {
                println!("{}", c.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scriptpipe_transport::LineTerminator;

    use super::*;

    #[test]
    fn describes_both_channels_in_order() {
        let endpoints = Endpoints::new(
            "/nonexistent/scriptpipe.to",
            "/nonexistent/scriptpipe.from",
            LineTerminator::CrLf,
        );
        let output = describe(&endpoints);
        assert_eq!(output.terminator, "CRLF");
        assert_eq!(output.channels[0].role, "outbound");
        assert_eq!(output.channels[1].path, "/nonexistent/scriptpipe.from");
        assert!(!output.channels[0].exists);

        let json = serde_json::to_string(&output).expect("endpoints output should serialize");
        assert!(json.contains("\"exists\":false"));
    }
}
