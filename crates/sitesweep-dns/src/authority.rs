//! Direct authoritative DNS lookups.
//!
//! NS discovery goes through the system resolver; A answers are pulled
//! from the domain's own nameserver with recursion disabled, so cached
//! third-party answers cannot leak in.

use std::net::{IpAddr, Ipv4Addr};

use sitesweep_core::{Result, SweepError};
use tracing::debug;

use crate::resolvers;

/// Authoritative DNS query client
pub struct AuthorityClient {
    _private: (),
}

impl Default for AuthorityClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityClient {
    /// Create a client using the system resolver configuration
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Delegated NS hostnames for a domain
    pub async fn nameservers(&self, domain: &str) -> Result<Vec<String>> {
        let resolver = resolvers::system();
        let response = resolver
            .ns_lookup(resolvers::fqdn(domain))
            .await
            .map_err(|e| SweepError::Dns(e.to_string()))?;

        Ok(response.iter().map(ToString::to_string).collect())
    }

    /// A records as served by the first listed nameserver that answers.
    ///
    /// Nameservers that do not resolve or do not answer are skipped;
    /// only a fully dry list is an error.
    pub async fn authoritative_a(
        &self,
        domain: &str,
        nameservers: &[String],
    ) -> Result<Vec<Ipv4Addr>> {
        let system = resolvers::system();
        let mut last_error = String::new();

        for ns in nameservers {
            let lookup = match system.lookup_ip(resolvers::fqdn(ns)).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    debug!(nameserver = %ns, error = %e, "listed nameserver did not resolve");
                    last_error = e.to_string();
                    continue;
                }
            };

            let Some(addr) = lookup.iter().find(IpAddr::is_ipv4) else {
                debug!(nameserver = %ns, "listed nameserver has no IPv4 address");
                continue;
            };

            debug!(nameserver = %ns, %addr, "querying authoritative nameserver");
            let authority = resolvers::pinned(addr, false);
            match authority.ipv4_lookup(resolvers::fqdn(domain)).await {
                Ok(answer) => return Ok(answer.iter().map(|a| a.0).collect()),
                Err(e) => {
                    debug!(nameserver = %ns, error = %e, "authoritative query failed");
                    last_error = e.to_string();
                }
            }
        }

        if last_error.is_empty() {
            Err(SweepError::Dns(format!("no reachable nameserver for {domain}")))
        } else {
            Err(SweepError::Dns(format!(
                "no nameserver answered for {domain}: {last_error}"
            )))
        }
    }
}
