use std::fmt;
use std::net::Ipv4Addr;

/// The server's own public IPv4 address, resolved once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerIdentity(Ipv4Addr);

impl ServerIdentity {
    /// Wrap a resolved public address
    #[must_use]
    pub const fn new(addr: Ipv4Addr) -> Self {
        Self(addr)
    }

    /// The public address
    #[must_use]
    pub const fn addr(&self) -> Ipv4Addr {
        self.0
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a domain's record set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Asked the domain's own authoritative nameserver directly
    DirectQuery,
    /// Read through the DNS provider's management API
    ProviderApi,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectQuery => f.write_str("direct query"),
            Self::ProviderApi => f.write_str("provider API"),
        }
    }
}

/// The IPv4 A records observed for one domain.
///
/// Recomputed for every site; an empty set is a valid answer and means
/// the lookup path produced nothing (including lookup failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordSet {
    source: RecordSource,
    records: Vec<Ipv4Addr>,
}

impl DnsRecordSet {
    /// Build a record set from a lookup result
    #[must_use]
    pub fn new(source: RecordSource, records: Vec<Ipv4Addr>) -> Self {
        Self { source, records }
    }

    /// The empty set, used whenever a lookup path fails
    #[must_use]
    pub const fn empty(source: RecordSource) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }

    /// Which path produced this set
    #[must_use]
    pub const fn source(&self) -> RecordSource {
        self.source
    }

    /// The records, in answer order
    #[must_use]
    pub fn records(&self) -> &[Ipv4Addr] {
        &self.records
    }

    /// Returns true if the lookup produced no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Membership test used by the decision engine
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.records.contains(&addr)
    }
}
