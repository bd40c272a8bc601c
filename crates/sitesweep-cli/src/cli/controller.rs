//! Controller face: open the report destination, then drive the agent
//! on the target host and commit its lines as they arrive.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use sitesweep_core::ReportLine;
use sitesweep_ops::report::{ReportSink, WriteMode};
use sitesweep_ops::transport::{CredentialEnv, SshTransport, Target, WorkOrder};
use tracing::{debug, warn};

use crate::cli::args::Cli;
use crate::settings::Credentials;

pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let raw_target = cli.target.as_deref().context("target host is required")?;
    let target = Target::parse(raw_target)?;

    // The sink opens before anything runs, so an unwritable destination
    // fails the run before the remote side starts.
    let mut sink = open_sink(cli)?;

    let credentials = Credentials::from_env();
    let transport = SshTransport::new(target, cli.remote_bin.clone());
    let order = WorkOrder {
        root: cli.root.clone(),
        remove: cli.remove,
        dry_run: cli.dry_run,
        debug: cli.debug,
        ns1: cli.ns1.clone(),
        ns2: cli.ns2.clone(),
        backup_dir: cli.backup_dir.clone(),
        site_prefix: cli.site_prefix.clone(),
        db_container: cli.db_container.clone(),
    };
    let env = CredentialEnv {
        provider_email: credentials.provider_email,
        provider_key: credentials.provider_key,
        db_password: credentials.db_password,
    };

    let mut sink_error = None;
    let code = transport
        .run(&order, &env, |line| match ReportLine::parse(line) {
            Some(parsed) => {
                println!("{parsed}");
                if sink_error.is_none() {
                    if let Err(e) = sink.commit(&parsed) {
                        sink_error = Some(e);
                    }
                }
            }
            None => warn!(line = %line, "ignoring stray agent output"),
        })
        .await?;

    if let Some(e) = sink_error {
        return Err(e.into());
    }

    debug!(code, "remote agent finished");
    Ok(u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from))
}

fn open_sink(cli: &Cli) -> Result<ReportSink> {
    let Some(path) = cli.output.as_deref() else {
        return Ok(ReportSink::discard());
    };
    let mode = resolve_mode(cli, path)?;
    Ok(ReportSink::file(path, mode)?)
}

/// Flags win. An existing destination without a flag asks when a human
/// is attached and fails fast otherwise.
fn resolve_mode(cli: &Cli, path: &Path) -> Result<WriteMode> {
    if cli.overwrite {
        return Ok(WriteMode::Overwrite);
    }
    if cli.append {
        return Ok(WriteMode::Append);
    }
    if !path.exists() {
        return Ok(WriteMode::Overwrite);
    }
    if !console::user_attended_stderr() {
        bail!("{} exists; pass --overwrite or --append", path.display());
    }

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{} already exists", path.display()))
        .items(&["Overwrite", "Append"])
        .default(0)
        .interact_on(&Term::stderr())?;

    Ok(if choice == 0 {
        WriteMode::Overwrite
    } else {
        WriteMode::Append
    })
}
