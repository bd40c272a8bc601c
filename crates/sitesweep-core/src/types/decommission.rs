use std::path::PathBuf;

use chrono::{DateTime, Local};

/// A compressed site backup produced ahead of removal
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    /// Domain the backup belongs to
    pub domain: String,

    /// When the backup was taken
    pub created_at: DateTime<Local>,

    /// Path of the `.tgz` archive
    pub archive_path: PathBuf,

    /// Path of the database dump captured inside the site tree, if any
    pub db_dump_path: Option<PathBuf>,
}

/// Decommission steps, in the order they run.
///
/// Backup steps come strictly before destructive ones so that a failure
/// mid-sequence never leaves a site destroyed but unarchived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Dump the site database from inside its container
    DbExport,
    /// Archive the site directory into the backup root
    Archive,
    /// Force-remove the site's primary container
    RemoveContainer,
    /// Drop the site database and database user
    DropDatabase,
    /// Delete the site directory
    RemoveDirectory,
}

impl Step {
    /// All steps in execution order
    pub const ALL: [Self; 5] = [
        Self::DbExport,
        Self::Archive,
        Self::RemoveContainer,
        Self::DropDatabase,
        Self::RemoveDirectory,
    ];

    /// Short name used in logs and outcome summaries
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DbExport => "db-export",
            Self::Archive => "archive",
            Self::RemoveContainer => "remove-container",
            Self::DropDatabase => "drop-database",
            Self::RemoveDirectory => "remove-directory",
        }
    }
}

/// How a single decommission step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step performed its work
    Done,
    /// Nothing to do (already removed, not running, or dry run)
    Noop,
    /// The step failed; the reason is recorded and the sequence continues
    Failed(String),
}

impl StepStatus {
    /// Returns true unless the step failed
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// One step's result inside a [`DecommissionOutcome`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Which step ran
    pub step: Step,
    /// How it ended
    pub status: StepStatus,
}

/// Everything that happened while decommissioning one site.
///
/// Failures are recorded here rather than propagated; the caller decides
/// what a partially failed sequence means for the run's exit status.
#[derive(Debug, Clone, Default)]
pub struct DecommissionOutcome {
    /// Domain the outcome belongs to
    pub domain: String,

    /// Step results in execution order
    pub steps: Vec<StepReport>,

    /// Non-fatal conditions worth surfacing
    pub warnings: Vec<String>,

    /// Backup artifact, when one was produced
    pub backup: Option<BackupArtifact>,
}

impl DecommissionOutcome {
    /// Start an outcome for a domain
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Record one step's result
    pub fn record(&mut self, step: Step, status: StepStatus) {
        self.steps.push(StepReport { step, status });
    }

    /// Record a non-fatal condition
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Number of failed steps
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|report| !report.status.succeeded())
            .count()
    }

    /// Returns true if no step failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Returns true if at least one step actually did work
    #[must_use]
    pub fn performed_work(&self) -> bool {
        self.steps
            .iter()
            .any(|report| report.status == StepStatus::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_counts_failures() {
        let mut outcome = DecommissionOutcome::new("stale.com");
        outcome.record(Step::DbExport, StepStatus::Noop);
        outcome.record(Step::Archive, StepStatus::Done);
        outcome.record(Step::RemoveContainer, StepStatus::Failed("docker exited 1".into()));
        assert_eq!(outcome.failure_count(), 1);
        assert!(!outcome.is_clean());
        assert!(outcome.performed_work());
    }

    #[test]
    fn all_noop_outcome_is_clean_and_idle() {
        let mut outcome = DecommissionOutcome::new("gone.com");
        for step in Step::ALL {
            outcome.record(step, StepStatus::Noop);
        }
        assert!(outcome.is_clean());
        assert!(!outcome.performed_work());
    }
}
