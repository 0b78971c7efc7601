//! Report sinks: where finished reports go.

use crate::{Report, ReportError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination for finished reports.
pub trait ReportSink {
    /// Persists one report. A later write for the same name replaces the earlier one.
    fn write(&mut self, report: &Report) -> Result<(), ReportError>;
}

/// Writes `<dir>/<report name>.json`, creating `dir` on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file a report with `name` is written to.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, ReportError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ReportError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl ReportSink for DirectorySink {
    fn write(&mut self, report: &Report) -> Result<(), ReportError> {
        let path = self.path_for(&report.name)?;
        std::fs::create_dir_all(&self.dir)?;

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!(report = %report.name, path = %path.display(), "report written");
        Ok(())
    }
}

/// Keeps every written report in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<Report>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent report written under `name`.
    pub fn latest(&self, name: &str) -> Option<&Report> {
        self.reports.iter().rev().find(|r| r.name == name)
    }
}

impl ReportSink for MemorySink {
    fn write(&mut self, report: &Report) -> Result<(), ReportError> {
        self.reports.push(report.clone());
        Ok(())
    }
}
