//! Container runtime access.
//!
//! One seam, two implementations: the real docker CLI in production and
//! whatever the decommission tests want to pretend happened.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{OpsError, OpsResult};

/// Container-side operations the decommission workflow needs
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// True if a container with this exact name exists in any state
    async fn container_exists(&self, name: &str) -> OpsResult<bool>;

    /// True if a container with this exact name is currently running
    async fn container_running(&self, name: &str) -> OpsResult<bool>;

    /// Run a command inside a running container, returning its stdout.
    ///
    /// `env` entries ride on the runtime's own environment so values
    /// stay off the argv.
    async fn exec(
        &self,
        container: &str,
        env: &[(&str, &str)],
        command: &[&str],
    ) -> OpsResult<String>;

    /// Force-remove a container
    async fn remove_container(&self, name: &str) -> OpsResult<()>;
}

/// The real docker CLI
pub struct DockerCli {
    _private: (),
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    /// Create a runtime handle over the `docker` binary on `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    async fn list_names(&self, all: bool) -> OpsResult<Vec<String>> {
        let mut cmd = base("docker");
        cmd.arg("ps");
        if all {
            cmd.arg("-a");
        }
        cmd.args(["--format", "{{.Names}}"]);

        let listing = finish_capture(cmd, "docker ps").await?;
        Ok(listing.lines().map(str::to_owned).collect())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn container_exists(&self, name: &str) -> OpsResult<bool> {
        Ok(self.list_names(true).await?.iter().any(|n| n == name))
    }

    async fn container_running(&self, name: &str) -> OpsResult<bool> {
        Ok(self.list_names(false).await?.iter().any(|n| n == name))
    }

    async fn exec(
        &self,
        container: &str,
        env: &[(&str, &str)],
        command: &[&str],
    ) -> OpsResult<String> {
        let mut cmd = base("docker");
        cmd.arg("exec");
        // `-e KEY` with no value makes docker read it from its own
        // environment, keeping secrets out of the process listing
        for (key, value) in env {
            cmd.arg("-e").arg(key);
            cmd.env(key, value);
        }
        cmd.arg(container);
        cmd.args(command);

        let what = format!("docker exec {container} {}", command.first().unwrap_or(&""));
        finish_capture(cmd, &what).await
    }

    async fn remove_container(&self, name: &str) -> OpsResult<()> {
        let mut cmd = base("docker");
        cmd.args(["rm", "-f", name]);
        finish_capture(cmd, &format!("docker rm -f {name}")).await?;
        Ok(())
    }
}

/// Command with stdin detached so a prompt can never hang the sweep
fn base(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null());
    cmd
}

async fn finish_capture(mut cmd: Command, what: &str) -> OpsResult<String> {
    debug!(command = what, "running");
    let output = cmd.output().await?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr.trim();
        if reason.is_empty() {
            Err(OpsError::Command(format!("{what}: exited with {}", output.status)))
        } else {
            Err(OpsError::Command(format!("{what}: {reason}")))
        }
    }
}
