//! DNS-facing half of the sweep: who this server is, and where each
//! domain actually points.
//!
//! Three pieces, glued together by the [`RecordResolver`]:
//!
//! - [`IdentityResolver`]: the server's own public IPv4 via the
//!   public-IP echo service
//! - [`AuthorityClient`]: NS discovery and direct authoritative A queries
//! - [`ProviderClient`]: A records through the provider management API

mod authority;
mod identity;
mod provider;
mod resolvers;
mod selector;

pub use authority::AuthorityClient;
pub use identity::IdentityResolver;
pub use provider::{ProviderClient, ProviderClientBuilder, ProviderCredentials};
pub use selector::{choose, NameserverMarkers, RecordResolver, Strategy};
