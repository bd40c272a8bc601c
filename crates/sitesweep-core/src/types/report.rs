use std::fmt;

use super::DecommissionOutcome;
use crate::reconcile::ReconciliationResult;

/// One `domain,true|false` record as it crosses the transport.
///
/// This is the only thing the agent prints to stdout; everything else
/// belongs on stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Domain the classification belongs to
    pub domain: String,
    /// Whether the domain resolves to this server
    pub matched: bool,
}

impl ReportLine {
    /// Build a report line
    #[must_use]
    pub fn new(domain: impl Into<String>, matched: bool) -> Self {
        Self {
            domain: domain.into(),
            matched,
        }
    }

    /// Parse a structured stdout line.
    ///
    /// Returns `None` for anything that is not exactly `domain,true` or
    /// `domain,false`; callers treat such lines as stray noise.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (domain, flag) = line.trim().split_once(',')?;
        if domain.is_empty() {
            return None;
        }
        let matched = match flag {
            "true" => true,
            "false" => false,
            _ => return None,
        };
        Some(Self::new(domain, matched))
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.domain, self.matched)
    }
}

impl From<&ReconciliationResult> for ReportLine {
    fn from(result: &ReconciliationResult) -> Self {
        Self::new(result.domain.clone(), result.matched)
    }
}

/// Per-run accumulator threaded through the site loop.
///
/// Deliberately an explicit value rather than process-global state; the
/// loop owns it and hands it back when the run ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Sites processed
    pub sites: usize,
    /// Sites whose DNS points at this server
    pub matched: usize,
    /// Sites pointing elsewhere (or nowhere)
    pub unmatched: usize,
    /// Sites where decommission performed work
    pub decommissioned: usize,
    /// Decommission steps that failed across the run
    pub failed_steps: usize,
    /// Warnings surfaced across the run
    pub warnings: usize,
}

impl RunSummary {
    /// Fold one classification into the summary
    pub fn record(&mut self, result: &ReconciliationResult) {
        self.sites += 1;
        if result.matched {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
    }

    /// Fold one decommission outcome into the summary
    pub fn record_outcome(&mut self, outcome: &DecommissionOutcome) {
        if outcome.performed_work() {
            self.decommissioned += 1;
        }
        self.failed_steps += outcome.failure_count();
        self.warnings += outcome.warnings.len();
    }

    /// Returns true if any decommission step failed
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed_steps > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Step, StepStatus};

    #[test]
    fn parse_accepts_only_structured_lines() {
        assert_eq!(
            ReportLine::parse("example.com,true"),
            Some(ReportLine::new("example.com", true))
        );
        assert_eq!(
            ReportLine::parse("  stale.com,false \n"),
            Some(ReportLine::new("stale.com", false))
        );
        assert_eq!(ReportLine::parse("example.com"), None);
        assert_eq!(ReportLine::parse("example.com,yes"), None);
        assert_eq!(ReportLine::parse(",true"), None);
        assert_eq!(ReportLine::parse("warning: something happened"), None);
    }

    #[test]
    fn display_round_trips() {
        let line = ReportLine::new("example.com", false);
        assert_eq!(line.to_string(), "example.com,false");
        assert_eq!(ReportLine::parse(&line.to_string()), Some(line));
    }

    #[test]
    fn summary_accumulates_failures() {
        let mut summary = RunSummary::default();
        let mut outcome = DecommissionOutcome::new("stale.com");
        outcome.record(Step::Archive, StepStatus::Done);
        outcome.record(Step::DropDatabase, StepStatus::Failed("no credential".into()));
        outcome.warn("db drop skipped");
        summary.record_outcome(&outcome);

        assert_eq!(summary.decommissioned, 1);
        assert_eq!(summary.failed_steps, 1);
        assert_eq!(summary.warnings, 1);
        assert!(summary.has_failures());
    }
}
