//! Per-domain DNS strategy selection.
//!
//! A domain whose delegation carries both reference nameservers is
//! provider-managed and is read through the management API; everything
//! else gets a direct authoritative query. Every failure on either path
//! collapses into an empty record set after a warning, so one broken
//! domain never stops the sweep.

use sitesweep_core::{DnsRecordSet, RecordSource};
use tracing::{debug, warn};

use crate::authority::AuthorityClient;
use crate::provider::ProviderClient;

/// The reference nameserver pair that marks provider-managed domains
#[derive(Debug, Clone)]
pub struct NameserverMarkers {
    ns1: String,
    ns2: String,
}

impl NameserverMarkers {
    /// Build the marker pair
    #[must_use]
    pub fn new(ns1: impl Into<String>, ns2: impl Into<String>) -> Self {
        Self {
            ns1: ns1.into(),
            ns2: ns2.into(),
        }
    }

    /// True when both reference nameservers appear in the delegated set.
    ///
    /// Comparison ignores case and trailing dots.
    #[must_use]
    pub fn all_present(&self, delegated: &[String]) -> bool {
        [&self.ns1, &self.ns2]
            .into_iter()
            .all(|marker| delegated.iter().any(|ns| names_equal(ns, marker)))
    }
}

fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Which lookup path a domain takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Read through the provider management API
    Provider,
    /// Ask the domain's own nameserver directly
    Direct,
}

/// Decide the path for one domain given its delegated nameservers.
///
/// The provider path wins whenever the markers match, even if the API
/// then turns out to be unusable; there is deliberately no fallback to
/// the direct path, so a misconfigured provider account surfaces as
/// unmatched domains instead of silently different answers.
#[must_use]
pub fn choose(markers: Option<&NameserverMarkers>, delegated: &[String]) -> Strategy {
    match markers {
        Some(markers) if markers.all_present(delegated) => Strategy::Provider,
        _ => Strategy::Direct,
    }
}

/// Per-domain record resolution with the never-fails policy
pub struct RecordResolver {
    authority: AuthorityClient,
    provider: Option<ProviderClient>,
    markers: Option<NameserverMarkers>,
}

impl RecordResolver {
    /// Build a resolver.
    ///
    /// `provider` is `None` when no API credentials are configured;
    /// `markers` is `None` unless both reference nameservers are set.
    #[must_use]
    pub fn new(provider: Option<ProviderClient>, markers: Option<NameserverMarkers>) -> Self {
        Self {
            authority: AuthorityClient::new(),
            provider,
            markers,
        }
    }

    /// Record set for one domain.
    ///
    /// Never fails: every error path produces an empty set tagged with
    /// the path that was attempted.
    pub async fn resolve(&self, domain: &str) -> DnsRecordSet {
        let delegated = match self.authority.nameservers(domain).await {
            Ok(nameservers) => nameservers,
            Err(e) => {
                warn!(domain = %domain, error = %e, "NS lookup failed");
                Vec::new()
            }
        };

        match choose(self.markers.as_ref(), &delegated) {
            Strategy::Provider => self.from_provider(domain).await,
            Strategy::Direct => self.from_authority(domain, &delegated).await,
        }
    }

    async fn from_provider(&self, domain: &str) -> DnsRecordSet {
        let Some(client) = &self.provider else {
            warn!(domain = %domain, "provider-delegated domain but no API credentials configured");
            return DnsRecordSet::empty(RecordSource::ProviderApi);
        };

        match client.a_records(domain).await {
            Ok(records) => {
                debug!(domain = %domain, count = records.len(), "provider API answered");
                DnsRecordSet::new(RecordSource::ProviderApi, records)
            }
            Err(e) => {
                warn!(domain = %domain, error = %e, "provider API lookup failed");
                DnsRecordSet::empty(RecordSource::ProviderApi)
            }
        }
    }

    async fn from_authority(&self, domain: &str, delegated: &[String]) -> DnsRecordSet {
        if delegated.is_empty() {
            warn!(domain = %domain, "no delegated nameservers");
            return DnsRecordSet::empty(RecordSource::DirectQuery);
        }

        match self.authority.authoritative_a(domain, delegated).await {
            Ok(records) => {
                debug!(domain = %domain, count = records.len(), "authoritative answer");
                DnsRecordSet::new(RecordSource::DirectQuery, records)
            }
            Err(e) => {
                warn!(domain = %domain, error = %e, "authoritative query failed");
                DnsRecordSet::empty(RecordSource::DirectQuery)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> NameserverMarkers {
        NameserverMarkers::new("ns1.provider.com", "ns2.provider.com")
    }

    fn delegated(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn both_markers_select_provider() {
        let ns = delegated(&["ns1.provider.com.", "ns2.provider.com."]);
        assert_eq!(choose(Some(&markers()), &ns), Strategy::Provider);
    }

    #[test]
    fn matching_ignores_case_and_trailing_dots() {
        let ns = delegated(&["NS1.Provider.COM", "ns2.provider.com."]);
        assert!(markers().all_present(&ns));
    }

    #[test]
    fn one_marker_is_not_enough() {
        let ns = delegated(&["ns1.provider.com.", "ns2.elsewhere.net."]);
        assert_eq!(choose(Some(&markers()), &ns), Strategy::Direct);
    }

    #[test]
    fn foreign_delegation_selects_direct() {
        let ns = delegated(&["dns1.registrar.example.", "dns2.registrar.example."]);
        assert_eq!(choose(Some(&markers()), &ns), Strategy::Direct);
    }

    #[test]
    fn unconfigured_markers_always_select_direct() {
        let ns = delegated(&["ns1.provider.com.", "ns2.provider.com."]);
        assert_eq!(choose(None, &ns), Strategy::Direct);
    }

    #[test]
    fn empty_delegation_selects_direct() {
        assert_eq!(choose(Some(&markers()), &[]), Strategy::Direct);
    }

    #[tokio::test]
    async fn provider_path_without_credentials_yields_empty_provider_set() {
        let resolver = RecordResolver::new(None, Some(markers()));
        let set = resolver.from_provider("example.com").await;
        assert!(set.is_empty());
        assert_eq!(set.source(), RecordSource::ProviderApi);
    }

    #[tokio::test]
    async fn empty_delegation_yields_empty_direct_set() {
        let resolver = RecordResolver::new(None, None);
        let set = resolver.from_authority("example.com", &[]).await;
        assert!(set.is_empty());
        assert_eq!(set.source(), RecordSource::DirectQuery);
    }
}
