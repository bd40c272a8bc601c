//! The reporting sink.
//!
//! Lines are committed one at a time, flushed as they arrive, so an
//! interrupted run keeps everything already classified.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sitesweep_core::ReportLine;
use tracing::debug;

use crate::error::{OpsError, OpsResult};

/// What to do with an existing destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate, then write
    Overwrite,
    /// Write after the existing content
    Append,
}

/// Where classification lines end up
pub enum ReportSink {
    /// Persist to a file
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
    /// No destination configured; lines are dropped after the run
    Discard,
}

impl ReportSink {
    /// Open a file sink.
    ///
    /// An unopenable destination is fatal for the run, so this is the
    /// first thing a run does, before any site is processed.
    pub fn file(path: &Path, mode: WriteMode) -> OpsResult<Self> {
        let file = match mode {
            WriteMode::Overwrite => File::create(path),
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path),
        }
        .map_err(|e| OpsError::Report(format!("cannot open {}: {e}", path.display())))?;

        debug!(path = %path.display(), ?mode, "report sink open");
        Ok(Self::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// A sink that drops everything
    #[must_use]
    pub const fn discard() -> Self {
        Self::Discard
    }

    /// Commit one line, flushing immediately
    pub fn commit(&mut self, line: &ReportLine) -> OpsResult<()> {
        match self {
            Self::File { path, writer } => writeln!(writer, "{line}")
                .and_then(|()| writer.flush())
                .map_err(|e| OpsError::Report(format!("write {}: {e}", path.display()))),
            Self::Discard => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn line(domain: &str, matched: bool) -> ReportLine {
        ReportLine::new(domain, matched)
    }

    #[test]
    fn overwrite_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "old.com,true\n").unwrap();

        let mut sink = ReportSink::file(&path, WriteMode::Overwrite).unwrap();
        sink.commit(&line("example.com", true)).unwrap();
        sink.commit(&line("stale.com", false)).unwrap();
        drop(sink);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "example.com,true\nstale.com,false\n"
        );
    }

    #[test]
    fn append_preserves_prior_lines_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "monday.com,true\n").unwrap();

        let mut sink = ReportSink::file(&path, WriteMode::Append).unwrap();
        sink.commit(&line("tuesday.com", false)).unwrap();
        drop(sink);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "monday.com,true\ntuesday.com,false\n"
        );
    }

    #[test]
    fn append_creates_a_missing_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.csv");

        let mut sink = ReportSink::file(&path, WriteMode::Append).unwrap();
        sink.commit(&line("first.com", true)).unwrap();
        drop(sink);

        assert_eq!(fs::read_to_string(&path).unwrap(), "first.com,true\n");
    }

    #[test]
    fn lines_are_visible_before_the_sink_closes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live.csv");

        let mut sink = ReportSink::file(&path, WriteMode::Overwrite).unwrap();
        sink.commit(&line("early.com", true)).unwrap();
        // still open; the committed line must already be on disk
        assert_eq!(fs::read_to_string(&path).unwrap(), "early.com,true\n");
        sink.commit(&line("late.com", false)).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "early.com,true\nlate.com,false\n"
        );
    }

    #[test]
    fn unwritable_destination_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/report.csv");
        assert!(ReportSink::file(&path, WriteMode::Overwrite).is_err());
    }

    #[test]
    fn discard_swallows_everything() {
        let mut sink = ReportSink::discard();
        sink.commit(&line("anything.com", true)).unwrap();
    }
}
