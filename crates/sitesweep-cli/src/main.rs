//! sitesweep - reconcile hosted sites against live DNS.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    sitesweep_cli::run().await
}
