//! # sitesweep-cli
//!
//! Command-line interface for the sitesweep fleet tooling.
//!
//! One binary, two faces:
//!
//! - **controller** (the default): opens the report destination, then
//!   drives the agent on a target host over SSH and commits each
//!   `domain,true|false` line as it arrives
//! - **agent** (`--agent`, hidden): runs the discovery, DNS lookup,
//!   reconciliation, and decommission pipeline on the host that owns
//!   the sites, keeping stdout machine-clean

pub mod cli;
pub mod settings;

pub use cli::run;
