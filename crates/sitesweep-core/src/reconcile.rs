//! The reconciliation decision engine.
//!
//! Pure membership comparison, no I/O: a site is local exactly when the
//! server's own public address appears in the domain's record set. Every
//! failure mode upstream collapses into an empty record set, so this
//! function never needs to know why a lookup produced nothing.

use crate::types::{DnsRecordSet, ServerIdentity};

/// Outcome of comparing one site's public DNS against the server identity
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    /// Domain that was classified
    pub domain: String,

    /// True when the domain resolves to this server
    pub matched: bool,

    /// The record set the decision was based on
    pub records: DnsRecordSet,
}

/// Classify one domain.
///
/// Deterministic and idempotent: same record set and identity, same
/// answer. An empty record set always classifies as unmatched.
#[must_use]
pub fn reconcile(
    domain: &str,
    identity: ServerIdentity,
    records: DnsRecordSet,
) -> ReconciliationResult {
    let matched = records.contains(identity.addr());
    ReconciliationResult {
        domain: domain.to_owned(),
        matched,
        records,
    }
}
