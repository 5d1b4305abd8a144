use std::path::Path;

use scriptpipe_transport::{ChannelRole, Endpoints};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoints = args.endpoints.resolve();
    let output = diagnose(&endpoints);
    print_doctor(&output, format);

    if output.overall == "pass" {
        Ok(SUCCESS)
    } else {
        Ok(HEALTH_CHECK_FAILED)
    }
}

fn diagnose(endpoints: &Endpoints) -> DoctorOutput {
    let mut checks = vec![platform_check(endpoints)];
    for role in [ChannelRole::Outbound, ChannelRole::Inbound] {
        checks.push(channel_check(role, endpoints.path(role)));
    }
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    }
}

fn platform_check(endpoints: &Endpoints) -> CheckResult {
    CheckResult {
        name: "platform".to_string(),
        status: CheckStatus::Info,
        detail: format!(
            "{} ({}), commands end with {}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            endpoints.terminator().name()
        ),
    }
}

fn channel_check(role: ChannelRole, path: &Path) -> CheckResult {
    let name = format!("{role}_pipe");
    match path.try_exists() {
        Ok(true) => CheckResult {
            name,
            status: pipe_type_status(path),
            detail: pipe_type_detail(path),
        },
        Ok(false) => CheckResult {
            name,
            status: CheckStatus::Fail,
            detail: format!(
                "{} not found (is Audacity running with mod-script-pipe enabled?)",
                path.display()
            ),
        },
        Err(err) => CheckResult {
            name,
            status: CheckStatus::Fail,
            detail: format!("{}: {err}", path.display()),
        },
    }
}

#[cfg(unix)]
fn is_fifo(path: &Path) -> Option<bool> {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(path).ok().map(|m| m.file_type().is_fifo())
}

#[cfg(unix)]
fn pipe_type_status(path: &Path) -> CheckStatus {
    match is_fifo(path) {
        Some(true) => CheckStatus::Pass,
        _ => CheckStatus::Fail,
    }
}

#[cfg(unix)]
fn pipe_type_detail(path: &Path) -> String {
    match is_fifo(path) {
        Some(true) => format!("{} is a named pipe", path.display()),
        Some(false) => format!("{} exists but is not a named pipe", path.display()),
        None => format!("{} exists but could not be inspected", path.display()),
    }
}

#[cfg(not(unix))]
fn pipe_type_status(_path: &Path) -> CheckStatus {
    CheckStatus::Pass
}

#[cfg(not(unix))]
fn pipe_type_detail(path: &Path) -> String {
    format!("{} is present", path.display())
}

fn compiled_features_check() -> CheckResult {
    let mut features = vec!["cli"];
    if cfg!(feature = "async") {
        features.push("async");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("scriptpipe doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
    }
}
