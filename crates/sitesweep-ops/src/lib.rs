//! Operational half of the sweep: discovery on disk, the
//! backup-then-remove workflow, the report sink, and the SSH transport
//! that ships the pipeline to a target host.

mod error;

pub mod archive;
pub mod decommission;
pub mod discovery;
pub mod report;
pub mod runtime;
pub mod transport;

pub use error::{OpsError, OpsResult};
