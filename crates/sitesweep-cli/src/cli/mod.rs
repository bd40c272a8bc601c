//! CLI parsing, dispatch, and exit-code mapping.

pub mod args;

mod agent;
mod controller;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::Cli;

/// Parse arguments and run the selected face of the binary.
///
/// Exit codes: 0 for a clean run, 1 for usage errors and fatal failures,
/// 2 when the sweep finished but some decommission step failed.
pub async fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(cli.debug);

    let outcome = if cli.agent {
        agent::run(&cli).await
    } else {
        controller::run(&cli).await
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout stays machine-clean.
///
/// `RUST_LOG` wins when set; otherwise `--debug` decides the level.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
