//! Remote execution over SSH.
//!
//! The controller side of the pipeline: ship the work order to the agent
//! binary on the target host, feed it credentials over stdin, stream its
//! stdout back line by line, and propagate its exit code. Remote stderr
//! passes straight through to the operator.

use std::process::Stdio;

use sitesweep_core::Secret;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{OpsError, OpsResult};

/// Account used when the target gives no explicit user
const DEFAULT_USER: &str = "root";

/// A remote target host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Account on the target
    pub user: String,
    /// Hostname or address
    pub host: String,
}

impl Target {
    /// Parse `host` or `user@host`; a bare host implies the
    /// administrative account.
    ///
    /// The destination lands on ssh's own argv, so anything that could
    /// read as an ssh option or split into extra words is rejected here.
    pub fn parse(raw: &str) -> OpsResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(OpsError::Transport("empty target host".to_owned()));
        }
        if raw.starts_with('-') || raw.chars().any(char::is_whitespace) {
            return Err(OpsError::Transport(format!("malformed target: {raw}")));
        }
        let (user, host) = match raw.split_once('@') {
            Some((user, host)) => (user, host),
            None => (DEFAULT_USER, raw),
        };
        if user.is_empty() || host.is_empty() {
            return Err(OpsError::Transport(format!("malformed target: {raw}")));
        }
        Ok(Self {
            user: user.to_owned(),
            host: host.to_owned(),
        })
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Everything the agent needs to know, minus the credentials
#[derive(Debug, Clone)]
pub struct WorkOrder {
    /// Fleet root on the target
    pub root: String,
    /// Decommission unmatched sites
    pub remove: bool,
    /// Describe destructive work instead of doing it
    pub dry_run: bool,
    /// Verbose agent logging
    pub debug: bool,
    /// Reference nameserver pair, when provider detection is wanted
    pub ns1: Option<String>,
    /// Second reference nameserver
    pub ns2: Option<String>,
    /// Backup root on the target
    pub backup_dir: String,
    /// Content-site service prefix
    pub site_prefix: String,
    /// Shared database server container
    pub db_container: String,
}

/// Credentials injected into the agent's environment over stdin.
///
/// These never appear on either side's argv and never in logs; the
/// agent folds them into its settings before the pipeline starts.
#[derive(Debug, Clone, Default)]
pub struct CredentialEnv {
    /// Provider account email
    pub provider_email: Option<String>,
    /// Provider API key
    pub provider_key: Option<Secret>,
    /// Fleet-wide database fallback credential
    pub db_password: Option<Secret>,
}

impl CredentialEnv {
    /// `KEY=VALUE` lines for the agent's stdin
    fn render(&self) -> String {
        let mut lines = String::new();
        if let Some(email) = &self.provider_email {
            lines.push_str("CF_API_EMAIL=");
            lines.push_str(email);
            lines.push('\n');
        }
        if let Some(key) = &self.provider_key {
            lines.push_str("CF_API_KEY=");
            lines.push_str(key.reveal());
            lines.push('\n');
        }
        if let Some(password) = &self.db_password {
            lines.push_str("DB_ROOT_PASSWORD=");
            lines.push_str(password.reveal());
            lines.push('\n');
        }
        lines
    }
}

/// SSH transport to the agent binary on a target host
pub struct SshTransport {
    target: Target,
    remote_bin: String,
}

impl SshTransport {
    /// Build a transport for one target
    #[must_use]
    pub fn new(target: Target, remote_bin: impl Into<String>) -> Self {
        Self {
            target,
            remote_bin: remote_bin.into(),
        }
    }

    /// Remote argv for the agent run. Credentials never appear here.
    ///
    /// sshd joins these with spaces and the remote shell splits them
    /// again, so every element is quoted to survive that round trip.
    fn remote_args(&self, order: &WorkOrder) -> Vec<String> {
        let mut args = vec![
            self.remote_bin.clone(),
            "--agent".to_owned(),
            "--env-stdin".to_owned(),
            "--root".to_owned(),
            order.root.clone(),
            "--backup-dir".to_owned(),
            order.backup_dir.clone(),
            "--site-prefix".to_owned(),
            order.site_prefix.clone(),
            "--db-container".to_owned(),
            order.db_container.clone(),
        ];
        if let (Some(ns1), Some(ns2)) = (&order.ns1, &order.ns2) {
            args.push("--ns1".to_owned());
            args.push(ns1.clone());
            args.push("--ns2".to_owned());
            args.push(ns2.clone());
        }
        if order.remove {
            args.push("--remove".to_owned());
        }
        if order.dry_run {
            args.push("--dry-run".to_owned());
        }
        if order.debug {
            args.push("--debug".to_owned());
        }
        args.iter().map(|arg| shell_quote(arg)).collect()
    }

    /// Run the agent remotely, handing each stdout line to `on_line`.
    ///
    /// Blocks until the remote process exits and returns its exit code;
    /// remote stderr is inherited so diagnostics reach the operator live.
    pub async fn run(
        &self,
        order: &WorkOrder,
        credentials: &CredentialEnv,
        mut on_line: impl FnMut(&str),
    ) -> OpsResult<i32> {
        let destination = self.target.destination();
        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg(&destination)
            .arg("--")
            .args(self.remote_args(order))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        debug!(target = %destination, bin = %self.remote_bin, "starting remote agent");
        let mut child = cmd
            .spawn()
            .map_err(|e| OpsError::Transport(format!("cannot start ssh: {e}")))?;

        // Credentials go over the pipe, never the argv
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(credentials.render().as_bytes())
                .await
                .map_err(|e| OpsError::Transport(format!("credential injection failed: {e}")))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| OpsError::Transport(format!("credential injection failed: {e}")))?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OpsError::Transport("remote stdout unavailable".to_owned()))?;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| OpsError::Transport(e.to_string()))?
        {
            on_line(&line);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| OpsError::Transport(e.to_string()))?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Single-quote one word for a POSIX shell.
///
/// Plain words pass through untouched; anything else is wrapped in
/// single quotes with embedded quotes rewritten to `'\''`.
fn shell_quote(arg: &str) -> String {
    fn plain(c: char) -> bool {
        c.is_ascii_alphanumeric()
            || matches!(c, '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-' | '_')
    }

    if !arg.is_empty() && arg.chars().all(plain) {
        return arg.to_owned();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
