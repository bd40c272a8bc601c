//! Server identity resolution.
//!
//! The classic dig trick: resolve the echo resolver through the system
//! configuration, then ask it for `myip.opendns.com`, which answers with
//! the asker's own public address.

use std::net::IpAddr;
use std::time::Duration;

use sitesweep_core::{Result, ServerIdentity, SweepError};
use tracing::{debug, warn};

use crate::resolvers;

/// Name that echoes the querier's public address
const ECHO_NAME: &str = "myip.opendns.com.";

/// Resolver that serves the echo name
const ECHO_RESOLVER: &str = "resolver1.opendns.com.";

/// Attempts before the failure becomes fatal
const MAX_ATTEMPTS: u32 = 3;

/// Resolves the server's own public IPv4 address
pub struct IdentityResolver {
    echo_name: String,
    echo_resolver: String,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    /// Create a resolver against the default echo service
    #[must_use]
    pub fn new() -> Self {
        Self {
            echo_name: ECHO_NAME.to_owned(),
            echo_resolver: ECHO_RESOLVER.to_owned(),
        }
    }

    /// Resolve the public address, retrying with bounded backoff.
    ///
    /// Failure here is fatal for the run: without an identity no
    /// classification is meaningful.
    pub async fn resolve(&self) -> Result<ServerIdentity> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let wait = Duration::from_secs(u64::from(attempt - 1));
                debug!(attempt, ?wait, "retrying identity resolution");
                tokio::time::sleep(wait).await;
            }

            match self.attempt().await {
                Ok(identity) => {
                    debug!(%identity, "resolved server identity");
                    return Ok(identity);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "identity resolution attempt failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(SweepError::Identity(format!(
            "no answer from {} after {MAX_ATTEMPTS} attempts: {last_error}",
            self.echo_name.trim_end_matches('.')
        )))
    }

    async fn attempt(&self) -> Result<ServerIdentity> {
        let system = resolvers::system();
        let lookup = system
            .lookup_ip(self.echo_resolver.as_str())
            .await
            .map_err(|e| SweepError::Dns(e.to_string()))?;

        let resolver_addr = lookup.iter().find(IpAddr::is_ipv4).ok_or_else(|| {
            SweepError::Dns(format!("{} has no IPv4 address", self.echo_resolver))
        })?;

        let echo = resolvers::pinned(resolver_addr, true);
        let answer = echo
            .ipv4_lookup(self.echo_name.as_str())
            .await
            .map_err(|e| SweepError::Dns(e.to_string()))?;

        let addr = answer
            .iter()
            .next()
            .ok_or_else(|| SweepError::Dns("echo service returned no records".to_owned()))?;

        Ok(ServerIdentity::new(addr.0))
    }
}
