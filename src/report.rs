//! Report sink
//!
//! Rules never print. Every finding goes through a [`ReportSink`], which the
//! engine creates per checked file and later aggregates.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity of a reported finding, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory style issue
    Notice,
    /// Quality problem, non-blocking
    Warning,
    /// Structural problem that breaks the package
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reported finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub file: PathBuf,
    pub severity: Severity,
    pub message: String,
    /// 1-based line number, when the finding is tied to a line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Offending source line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ReportEntry {
    pub fn new(file: &Path, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            severity,
            message: message.into(),
            line: None,
            code: None,
        }
    }

    pub fn at_line(mut self, line: usize, code: impl Into<String>) -> Self {
        self.line = Some(line);
        self.code = Some(code.into());
        self
    }
}

/// Destination for findings. Calling any method several times per file is fine.
pub trait ReportSink {
    fn add_entry(&mut self, entry: ReportEntry);

    fn add_error(&mut self, file: &Path, message: String) {
        self.add_entry(ReportEntry::new(file, Severity::Error, message));
    }

    fn add_warning(&mut self, file: &Path, message: String) {
        self.add_entry(ReportEntry::new(file, Severity::Warning, message));
    }

    fn add_notice(&mut self, file: &Path, message: String) {
        self.add_entry(ReportEntry::new(file, Severity::Notice, message));
    }
}

/// In-memory accumulating sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ReportEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }
}

impl ReportSink for Report {
    fn add_entry(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }
}
