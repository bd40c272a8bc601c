//! The backup-then-remove workflow.
//!
//! Order is load-bearing: the export and the archive run before anything
//! destructive, so a failure mid-sequence always leaves the data
//! recoverable. Every step is best-effort and idempotent; running the
//! sequence against an already-removed site reports five no-ops.

use std::path::PathBuf;

use chrono::Local;
use sitesweep_core::{BackupArtifact, DecommissionOutcome, Secret, Site, Step, StepStatus};
use tracing::{debug, info, warn};

use crate::archive;
use crate::runtime::ContainerRuntime;

/// Dump path the export step produces, relative to the site directory.
///
/// The container's wp root is the site's `www/` mount, so a dump written
/// to `wp-content/mysql.sql` inside the container lands here on the host
/// and gets picked up by the archive step.
const DB_DUMP_REL: &str = "www/wp-content/mysql.sql";

/// In-container database export command
const WP_DB_EXPORT: [&str; 6] = [
    "wp",
    "db",
    "export",
    "wp-content/mysql.sql",
    "--skip-themes",
    "--quiet",
];

/// Tunables for one decommission run
pub struct DecommissionConfig {
    /// Shared backup root the archives land in
    pub backup_dir: PathBuf,

    /// Name of the shared database server container
    pub db_container: String,

    /// Fleet-wide database credential, used when a site declares none
    pub db_fallback_password: Option<Secret>,

    /// Describe instead of doing
    pub dry_run: bool,
}

/// Back up and remove one site.
///
/// Never fails as a whole: each step folds its own errors into the
/// outcome and the sequence always runs to the end.
pub async fn decommission(
    runtime: &dyn ContainerRuntime,
    config: &DecommissionConfig,
    site: &Site,
) -> DecommissionOutcome {
    let mut outcome = DecommissionOutcome::new(&site.domain);
    info!(domain = %site.domain, dry_run = config.dry_run, "decommissioning site");

    export_database(runtime, config, site, &mut outcome).await;
    archive_directory(config, site, &mut outcome).await;
    remove_container(runtime, config, site, &mut outcome).await;
    drop_database(runtime, config, site, &mut outcome).await;
    remove_directory(config, site, &mut outcome).await;

    outcome
}

async fn export_database(
    runtime: &dyn ContainerRuntime,
    config: &DecommissionConfig,
    site: &Site,
    outcome: &mut DecommissionOutcome,
) {
    let step = Step::DbExport;
    if config.dry_run {
        debug!(domain = %site.domain, "dry run: would export database");
        outcome.record(step, StepStatus::Noop);
        return;
    }

    match runtime.container_running(&site.container).await {
        Ok(false) => {
            debug!(container = %site.container, "container not running, nothing to export");
            outcome.record(step, StepStatus::Noop);
        }
        Ok(true) => match runtime.exec(&site.container, &[], &WP_DB_EXPORT).await {
            Ok(_) => {
                debug!(domain = %site.domain, "database exported into site tree");
                outcome.record(step, StepStatus::Done);
            }
            Err(e) => {
                warn!(domain = %site.domain, error = %e, "database export failed");
                outcome.record(step, StepStatus::Failed(e.to_string()));
            }
        },
        Err(e) => {
            warn!(container = %site.container, error = %e, "could not query container state");
            outcome.record(step, StepStatus::Failed(e.to_string()));
        }
    }
}

async fn archive_directory(
    config: &DecommissionConfig,
    site: &Site,
    outcome: &mut DecommissionOutcome,
) {
    let step = Step::Archive;
    if config.dry_run {
        debug!(domain = %site.domain, "dry run: would archive site directory");
        outcome.record(step, StepStatus::Noop);
        return;
    }
    if !site.path.exists() {
        debug!(path = %site.path.display(), "site directory already gone");
        outcome.record(step, StepStatus::Noop);
        return;
    }

    let site_dir = site.path.clone();
    let backup_dir = config.backup_dir.clone();
    let domain = site.domain.clone();
    let archived =
        tokio::task::spawn_blocking(move || archive::archive_site(&site_dir, &backup_dir, &domain))
            .await;

    match archived {
        Ok(Ok((archive_path, skipped))) => {
            if skipped > 0 {
                outcome.warn(format!(
                    "{skipped} entries skipped while archiving {}",
                    site.domain
                ));
            }
            info!(archive = %archive_path.display(), "site archived");
            let db_dump = site.path.join(DB_DUMP_REL);
            outcome.backup = Some(BackupArtifact {
                domain: site.domain.clone(),
                created_at: Local::now(),
                archive_path,
                db_dump_path: db_dump.exists().then_some(db_dump),
            });
            outcome.record(step, StepStatus::Done);
        }
        Ok(Err(e)) => {
            warn!(domain = %site.domain, error = %e, "archive failed");
            outcome.record(step, StepStatus::Failed(e.to_string()));
        }
        Err(e) => {
            outcome.record(step, StepStatus::Failed(format!("archive task failed: {e}")));
        }
    }
}

async fn remove_container(
    runtime: &dyn ContainerRuntime,
    config: &DecommissionConfig,
    site: &Site,
    outcome: &mut DecommissionOutcome,
) {
    let step = Step::RemoveContainer;
    if config.dry_run {
        debug!(container = %site.container, "dry run: would remove container");
        outcome.record(step, StepStatus::Noop);
        return;
    }

    match runtime.container_exists(&site.container).await {
        Ok(false) => {
            debug!(container = %site.container, "container already absent");
            outcome.record(step, StepStatus::Noop);
        }
        Ok(true) => match runtime.remove_container(&site.container).await {
            Ok(()) => {
                info!(container = %site.container, "container removed");
                outcome.record(step, StepStatus::Done);
            }
            Err(e) => {
                warn!(container = %site.container, error = %e, "container removal failed");
                outcome.record(step, StepStatus::Failed(e.to_string()));
            }
        },
        Err(e) => {
            warn!(container = %site.container, error = %e, "could not query container state");
            outcome.record(step, StepStatus::Failed(e.to_string()));
        }
    }
}

async fn drop_database(
    runtime: &dyn ContainerRuntime,
    config: &DecommissionConfig,
    site: &Site,
    outcome: &mut DecommissionOutcome,
) {
    let step = Step::DropDatabase;
    if config.dry_run {
        debug!(domain = %site.domain, "dry run: would drop database");
        outcome.record(step, StepStatus::Noop);
        return;
    }

    let Some(password) = site
        .db_password
        .as_ref()
        .or(config.db_fallback_password.as_ref())
    else {
        warn!(domain = %site.domain, "no database credential, drop skipped");
        outcome.warn(format!(
            "no database credential for {}, drop skipped",
            site.domain
        ));
        outcome.record(step, StepStatus::Noop);
        return;
    };

    match runtime.container_running(&config.db_container).await {
        Ok(false) => {
            warn!(container = %config.db_container, "database server not running, drop skipped");
            outcome.warn(format!(
                "database server {} not running, drop skipped",
                config.db_container
            ));
            outcome.record(step, StepStatus::Noop);
        }
        Ok(true) => {
            let db = site.database_name();
            let env = [("MYSQL_PWD", password.reveal())];

            let probe = format!("SHOW DATABASES LIKE '{db}'");
            let listing = match runtime
                .exec(&config.db_container, &env, &["mysql", "-uroot", "-N", "-e", &probe])
                .await
            {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(database = %db, error = %e, "database probe failed");
                    outcome.record(step, StepStatus::Failed(e.to_string()));
                    return;
                }
            };
            if listing.trim().is_empty() {
                debug!(database = %db, "database already dropped");
                outcome.record(step, StepStatus::Noop);
                return;
            }

            let sql = drop_statements(&db);
            match runtime
                .exec(&config.db_container, &env, &["mysql", "-uroot", "-e", &sql])
                .await
            {
                Ok(_) => {
                    info!(database = %db, "database and user dropped");
                    outcome.record(step, StepStatus::Done);
                }
                Err(e) => {
                    warn!(database = %db, error = %e, "database drop failed");
                    outcome.record(step, StepStatus::Failed(e.to_string()));
                }
            }
        }
        Err(e) => {
            warn!(container = %config.db_container, error = %e, "database server state unknown");
            outcome.record(step, StepStatus::Failed(e.to_string()));
        }
    }
}

async fn remove_directory(
    config: &DecommissionConfig,
    site: &Site,
    outcome: &mut DecommissionOutcome,
) {
    let step = Step::RemoveDirectory;
    if config.dry_run {
        debug!(path = %site.path.display(), "dry run: would remove site directory");
        outcome.record(step, StepStatus::Noop);
        return;
    }
    if !site.path.exists() {
        debug!(path = %site.path.display(), "site directory already gone");
        outcome.record(step, StepStatus::Noop);
        return;
    }

    match tokio::fs::remove_dir_all(&site.path).await {
        Ok(()) => {
            info!(path = %site.path.display(), "site directory removed");
            outcome.record(step, StepStatus::Done);
        }
        Err(e) => {
            warn!(path = %site.path.display(), error = %e, "site directory removal failed");
            outcome.record(step, StepStatus::Failed(e.to_string()));
        }
    }
}

/// The drop runs under `IF EXISTS` on both names so a replay is harmless
fn drop_statements(db: &str) -> String {
    format!("DROP DATABASE IF EXISTS `{db}`; DROP USER IF EXISTS '{db}'@'%';")
}
