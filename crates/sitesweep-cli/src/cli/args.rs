//! Command-line argument definitions

use std::path::PathBuf;

use clap::Parser;

/// sitesweep - reconcile hosted sites against live DNS
///
/// Discovers the sites hosted on the target, looks up where each domain
/// actually points, and reports one `domain,true|false` line per site.
/// With `--remove`, sites that point elsewhere are backed up and retired.
#[derive(Parser, Debug)]
#[command(name = "sitesweep")]
#[command(author, version, about)]
pub struct Cli {
    /// Target host (`host` or `user@host`; a bare host implies root)
    #[arg(value_name = "TARGET", required_unless_present = "agent")]
    pub target: Option<String>,

    /// Write the `domain,true|false` report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Replace an existing report file
    #[arg(long, requires = "output", conflicts_with = "append")]
    pub overwrite: bool,

    /// Append to an existing report file
    #[arg(long, requires = "output")]
    pub append: bool,

    /// Back up and remove the sites whose DNS points elsewhere
    #[arg(short, long)]
    pub remove: bool,

    /// Describe destructive work instead of performing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub debug: bool,

    // ========================================================================
    // Fleet layout
    // ========================================================================
    /// Directory holding one subdirectory per hosted site
    #[arg(long, env = "DOMAIN_PATH", default_value = "/var/opt", value_name = "PATH")]
    pub root: String,

    /// Directory the decommission archives land in
    #[arg(long, default_value = "/var/opt/backups", value_name = "PATH")]
    pub backup_dir: String,

    /// Service-name prefix that marks a directory as a site
    #[arg(long, default_value = "wp_", value_name = "PREFIX")]
    pub site_prefix: String,

    /// Name of the shared database server container
    #[arg(long, default_value = "mysql", value_name = "NAME")]
    pub db_container: String,

    // ========================================================================
    // DNS strategy
    // ========================================================================
    /// First reference nameserver marking provider-managed domains
    #[arg(long, env = "NS1", value_name = "HOST")]
    pub ns1: Option<String>,

    /// Second reference nameserver marking provider-managed domains
    #[arg(long, env = "NS2", value_name = "HOST")]
    pub ns2: Option<String>,

    // ========================================================================
    // Transport internals
    // ========================================================================
    /// Path of this binary on the target host
    #[arg(long, default_value = "sitesweep", value_name = "PATH")]
    pub remote_bin: String,

    /// Run the pipeline on this host instead of driving a remote one
    #[arg(long, hide = true)]
    pub agent: bool,

    /// Read KEY=VALUE credential lines from stdin before starting
    #[arg(long, hide = true)]
    pub env_stdin: bool,
}
