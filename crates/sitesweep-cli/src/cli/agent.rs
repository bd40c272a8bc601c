//! Agent face: the sweep pipeline, run on the host that owns the sites.
//!
//! stdout carries nothing but `domain,true|false` lines; every
//! diagnostic goes to stderr through tracing. Sites are processed
//! strictly one at a time, and each line is flushed as soon as the
//! classification is known, so the controller sees progress live.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use sitesweep_core::{reconcile, DnsRecordSet, ReportLine, RunSummary, ServerIdentity, Site};
use sitesweep_dns::{IdentityResolver, NameserverMarkers, ProviderClient, RecordResolver};
use sitesweep_ops::decommission::{self, DecommissionConfig};
use sitesweep_ops::discovery;
use sitesweep_ops::runtime::{ContainerRuntime, DockerCli};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::cli::args::Cli;
use crate::settings::Credentials;

pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let mut credentials = Credentials::from_env();
    if cli.env_stdin {
        let mut injected = String::new();
        tokio::io::stdin()
            .read_to_string(&mut injected)
            .await
            .context("reading injected credentials")?;
        credentials.apply_env_lines(&injected);
    }

    // Identity is resolved once and is the only fatal lookup of the run.
    let identity = IdentityResolver::new().resolve().await?;
    info!(%identity, "server identity resolved");

    let root = PathBuf::from(&cli.root);
    let sites = discovery::discover(&root, &cli.site_prefix)?;
    info!(count = sites.len(), root = %root.display(), "sites discovered");

    let markers = match (&cli.ns1, &cli.ns2) {
        (Some(ns1), Some(ns2)) => Some(NameserverMarkers::new(ns1.as_str(), ns2.as_str())),
        _ => None,
    };
    let provider = credentials.provider().map(ProviderClient::new);
    let resolver = RecordResolver::new(provider, markers);

    let runtime = DockerCli::new();
    let sweeper = Sweeper {
        runtime: &runtime,
        config: DecommissionConfig {
            backup_dir: PathBuf::from(&cli.backup_dir),
            db_container: cli.db_container.clone(),
            db_fallback_password: credentials.db_password.clone(),
            dry_run: cli.dry_run,
        },
        identity,
        remove: cli.remove,
    };

    let mut out = std::io::stdout();
    let mut summary = RunSummary::default();
    for site in &sites {
        let records = resolver.resolve(&site.domain).await;
        sweeper.settle(&mut out, site, records, &mut summary).await?;
    }

    info!(
        sites = summary.sites,
        matched = summary.matched,
        unmatched = summary.unmatched,
        decommissioned = summary.decommissioned,
        failed_steps = summary.failed_steps,
        "sweep complete"
    );

    Ok(if summary.has_failures() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

/// Everything the per-site loop holds fixed; each site only brings its
/// own record set.
struct Sweeper<'a> {
    runtime: &'a dyn ContainerRuntime,
    config: DecommissionConfig,
    identity: ServerIdentity,
    remove: bool,
}

impl Sweeper<'_> {
    /// Classify one site, emit its report line, and decommission when
    /// both the classification and the flags call for it.
    ///
    /// A matched site is never decommissioned, whatever the flags say,
    /// and the line goes out before any removal work starts.
    async fn settle(
        &self,
        out: &mut impl Write,
        site: &Site,
        records: DnsRecordSet,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let result = reconcile(&site.domain, self.identity, records);
        summary.record(&result);
        debug!(
            domain = %result.domain,
            matched = result.matched,
            source = %result.records.source(),
            "site classified"
        );

        // Flushed per line; stdout is block-buffered under the transport
        let line = ReportLine::from(&result);
        writeln!(out, "{line}")?;
        out.flush()?;

        if !result.matched && self.remove {
            let outcome = decommission::decommission(self.runtime, &self.config, site).await;
            summary.record_outcome(&outcome);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sitesweep_core::RecordSource;
    use sitesweep_ops::OpsResult;
    use std::fs;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SERVER: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);
    const ELSEWHERE: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 9);

    /// Runtime that only counts how often it was asked anything
    #[derive(Default)]
    struct TallyRuntime {
        calls: AtomicUsize,
    }

    impl TallyRuntime {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContainerRuntime for TallyRuntime {
        async fn container_exists(&self, _name: &str) -> OpsResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn container_running(&self, _name: &str) -> OpsResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn exec(
            &self,
            _container: &str,
            _env: &[(&str, &str)],
            _command: &[&str],
        ) -> OpsResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }

        async fn remove_container(&self, _name: &str) -> OpsResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn site_under(root: &TempDir, domain: &str) -> Site {
        let dir = root.path().join(domain);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.php"), "<?php\n").unwrap();
        Site::new(domain, dir, format!("wp_{}", domain.replace('.', "")))
    }

    fn sweeper<'a>(root: &TempDir, runtime: &'a dyn ContainerRuntime, remove: bool) -> Sweeper<'a> {
        Sweeper {
            runtime,
            config: DecommissionConfig {
                backup_dir: root.path().join("backups"),
                db_container: "mysql".to_owned(),
                db_fallback_password: None,
                dry_run: false,
            },
            identity: ServerIdentity::new(SERVER),
            remove,
        }
    }

    #[tokio::test]
    async fn matched_site_is_never_decommissioned() {
        let root = TempDir::new().unwrap();
        let site = site_under(&root, "keep.com");
        let runtime = TallyRuntime::default();
        let sweep = sweeper(&root, &runtime, true);

        let records = DnsRecordSet::new(RecordSource::DirectQuery, vec![ELSEWHERE, SERVER]);
        let mut out = Vec::new();
        let mut summary = RunSummary::default();
        sweep.settle(&mut out, &site, records, &mut summary).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "keep.com,true\n");
        // the runtime was never consulted and nothing on disk moved
        assert_eq!(runtime.calls(), 0);
        assert!(site.path.exists());
        assert!(!sweep.config.backup_dir.exists());
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.decommissioned, 0);
    }

    #[tokio::test]
    async fn unmatched_site_is_decommissioned_when_removal_is_on() {
        let root = TempDir::new().unwrap();
        let site = site_under(&root, "stale.com");
        let runtime = TallyRuntime::default();
        let sweep = sweeper(&root, &runtime, true);

        let records = DnsRecordSet::new(RecordSource::DirectQuery, vec![ELSEWHERE]);
        let mut out = Vec::new();
        let mut summary = RunSummary::default();
        sweep.settle(&mut out, &site, records, &mut summary).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "stale.com,false\n");
        assert!(runtime.calls() > 0);
        assert!(!site.path.exists());
        assert_eq!(fs::read_dir(&sweep.config.backup_dir).unwrap().count(), 1);
        assert_eq!(summary.decommissioned, 1);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn unmatched_site_is_left_alone_without_the_flag() {
        let root = TempDir::new().unwrap();
        let site = site_under(&root, "stale.com");
        let runtime = TallyRuntime::default();
        let sweep = sweeper(&root, &runtime, false);

        let records = DnsRecordSet::empty(RecordSource::ProviderApi);
        let mut out = Vec::new();
        let mut summary = RunSummary::default();
        sweep.settle(&mut out, &site, records, &mut summary).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "stale.com,false\n");
        assert_eq!(runtime.calls(), 0);
        assert!(site.path.exists());
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.decommissioned, 0);
    }
}
