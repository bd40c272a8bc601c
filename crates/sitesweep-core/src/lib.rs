//! Core types and decision engine for the sitesweep fleet tooling.
//!
//! This crate provides the foundational pieces shared by the rest of the
//! workspace:
//!
//! - **Types**: sites, record sets, decommission outcomes, report lines
//! - **Decision engine**: the pure [`reconcile`] membership comparison
//! - **Errors**: workspace-wide error handling with [`SweepError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use sitesweep_core::{reconcile, DnsRecordSet, RecordSource, ServerIdentity};
//!
//! let identity = ServerIdentity::new("203.0.113.5".parse()?);
//! let records = DnsRecordSet::new(RecordSource::DirectQuery, vec!["203.0.113.5".parse()?]);
//! let result = reconcile("example.com", identity, records);
//! assert!(result.matched);
//! ```

mod error;
mod reconcile;
pub mod types;

pub use error::{Result, SweepError};
pub use reconcile::{reconcile, ReconciliationResult};
pub use types::*;
