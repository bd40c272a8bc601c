//! Shared hickory resolver construction.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

/// Per-query timeout for every DNS lookup in the sweep
pub(crate) const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Attempts per lookup before the resolver gives up
pub(crate) const QUERY_ATTEMPTS: usize = 2;

/// Resolver using the system configuration
pub(crate) fn system() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio(ResolverConfig::default(), opts(true))
}

/// Resolver pinned at a single nameserver.
///
/// With `recursive` off the answer is whatever that server holds itself,
/// which is what an authoritative query wants.
pub(crate) fn pinned(addr: IpAddr, recursive: bool) -> TokioAsyncResolver {
    let group = NameServerConfigGroup::from_ips_clear(&[addr], 53, true);
    let config = ResolverConfig::from_parts(None, vec![], group);
    TokioAsyncResolver::tokio(config, opts(recursive))
}

/// Qualify a name so search domains never get appended
pub(crate) fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{name}.")
    }
}

fn opts(recursive: bool) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = QUERY_TIMEOUT;
    opts.attempts = QUERY_ATTEMPTS;
    opts.recursion_desired = recursive;
    opts
}
