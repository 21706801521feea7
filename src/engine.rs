//! Check engine
//!
//! Runs the enabled rules over every discovered file:
//! - **Async I/O**: file discovery and reading file contents
//! - **Blocking CPU work**: the rules themselves, inside `spawn_blocking`
//! - **Bounded concurrency**: a semaphore caps the number of files in flight
//! - **Aggregation**: `futures::try_join_all` keeps results in discovery order
//!
//! Every file gets its own [`Report`]; rules share nothing mutable, the
//! grammar store inside the manifest rule is read-only.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CheckError, Result};
use crate::file_discovery::FileDiscovery;
use crate::report::{Report, ReportEntry, Severity};
use crate::rules::{RuleId, RuleSet};

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Number of files checked concurrently
    pub max_concurrent_checks: usize,
    /// Timeout for checking a single file
    pub check_timeout: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: num_cpus::get(),
            check_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of checking a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    /// Every applicable rule ran
    Checked,
    /// No enabled rule applies to the file
    Skipped { reason: String },
    /// The file could not be checked (unreadable, timed out)
    Failed { message: String },
}

impl FileStatus {
    pub fn is_checked(&self) -> bool {
        matches!(self, FileStatus::Checked)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, FileStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

/// Result of checking a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Rules that ran on the file
    pub rules: Vec<RuleId>,
    pub entries: Vec<ReportEntry>,
    pub duration: Duration,
}

impl FileReport {
    pub fn checked(
        path: PathBuf,
        rules: Vec<RuleId>,
        entries: Vec<ReportEntry>,
        duration: Duration,
    ) -> Self {
        Self {
            path,
            status: FileStatus::Checked,
            rules,
            entries,
            duration,
        }
    }

    pub fn skipped(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path,
            status: FileStatus::Skipped {
                reason: reason.into(),
            },
            rules: Vec::new(),
            entries: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn failed(path: PathBuf, error: CheckError, duration: Duration) -> Self {
        Self {
            path,
            status: FileStatus::Failed {
                message: error.to_string(),
            },
            rules: Vec::new(),
            entries: Vec::new(),
            duration,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }
}

/// Progress update while checking
#[derive(Debug, Clone)]
pub struct CheckProgress {
    /// File that just finished
    pub current_file: Option<PathBuf>,
    pub completed: usize,
    pub total: usize,
    pub phase: CheckPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Discovery,
    Checking,
    Complete,
}

/// Progress callback type for check updates
pub type ProgressCallback = Arc<dyn Fn(CheckProgress) + Send + Sync>;

/// Aggregated results of checking a path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResults {
    pub started_at: DateTime<Utc>,
    pub total_files: usize,
    pub checked_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub notice_count: usize,
    pub discovery_duration: Duration,
    pub total_duration: Duration,
    pub file_results: Vec<FileReport>,
}

impl CheckResults {
    /// Aggregate individual file reports into a summary
    pub fn aggregate(started_at: DateTime<Utc>, file_results: Vec<FileReport>) -> Self {
        let mut results = Self {
            started_at,
            total_files: file_results.len(),
            checked_files: 0,
            skipped_files: 0,
            failed_files: 0,
            error_count: 0,
            warning_count: 0,
            notice_count: 0,
            discovery_duration: Duration::ZERO,
            total_duration: Duration::ZERO,
            file_results: Vec::new(),
        };

        for report in &file_results {
            match report.status {
                FileStatus::Checked => results.checked_files += 1,
                FileStatus::Skipped { .. } => results.skipped_files += 1,
                FileStatus::Failed { .. } => results.failed_files += 1,
            }
            for entry in &report.entries {
                match entry.severity {
                    Severity::Error => results.error_count += 1,
                    Severity::Warning => results.warning_count += 1,
                    Severity::Notice => results.notice_count += 1,
                }
            }
            results.total_duration += report.duration;
        }

        results.file_results = file_results;
        results
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error_count,
            Severity::Warning => self.warning_count,
            Severity::Notice => self.notice_count,
        }
    }

    /// All entries, file by file
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.file_results.iter().flat_map(|r| r.entries.iter())
    }

    /// Error-severity entries or files that could not be checked
    pub fn has_errors(&self) -> bool {
        self.error_count > 0 || self.failed_files > 0
    }

    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0 && self.notice_count == 0
    }
}

/// Concurrent rule runner
pub struct CheckEngine {
    rules: Arc<RuleSet>,
    config: CheckConfig,
}

impl CheckEngine {
    pub fn new(rules: RuleSet, config: CheckConfig) -> Self {
        Self {
            rules: Arc::new(rules),
            config,
        }
    }

    /// Check every file discovered under `path`
    pub async fn check_path(&self, path: &Path, discovery: &FileDiscovery) -> Result<CheckResults> {
        self.check_path_with_progress(path, discovery, None).await
    }

    pub async fn check_path_with_progress(
        &self,
        path: &Path,
        discovery: &FileDiscovery,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<CheckResults> {
        let started_at = Utc::now();
        let workflow_start = Instant::now();

        if let Some(ref callback) = progress_callback {
            callback(CheckProgress {
                current_file: None,
                completed: 0,
                total: 0,
                phase: CheckPhase::Discovery,
            });
        }

        let files = discovery.discover_files(path).await?;
        let discovery_duration = workflow_start.elapsed();
        info!(
            "Checking {} files under {} with rules {:?}",
            files.len(),
            path.display(),
            self.rules.ids()
        );

        let reports = self
            .check_files_with_progress(files, progress_callback.clone())
            .await?;

        let mut results = CheckResults::aggregate(started_at, reports);
        results.discovery_duration = discovery_duration;
        results.total_duration = workflow_start.elapsed();

        if let Some(ref callback) = progress_callback {
            callback(CheckProgress {
                current_file: None,
                completed: results.total_files,
                total: results.total_files,
                phase: CheckPhase::Complete,
            });
        }

        Ok(results)
    }

    pub async fn check_files(&self, files: Vec<PathBuf>) -> Result<Vec<FileReport>> {
        self.check_files_with_progress(files, None).await
    }

    /// Check a list of files concurrently, results in input order
    pub async fn check_files_with_progress(
        &self,
        files: Vec<PathBuf>,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<Vec<FileReport>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let total_files = files.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_checks.max(1),
        ));

        let tasks: Vec<_> = files
            .into_iter()
            .map(|file_path| {
                let rules = Arc::clone(&self.rules);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.config.check_timeout;
                let progress_callback = progress_callback.clone();
                let completed = Arc::clone(&completed);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        CheckError::Concurrency {
                            details: "Failed to acquire check semaphore".to_string(),
                        }
                    })?;

                    let report = Self::check_single_file_internal(file_path.clone(), rules, timeout).await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = progress_callback {
                        callback(CheckProgress {
                            current_file: Some(file_path),
                            completed: done,
                            total: total_files,
                            phase: CheckPhase::Checking,
                        });
                    }

                    Ok::<FileReport, CheckError>(report)
                })
            })
            .collect();

        let task_results = try_join_all(tasks)
            .await
            .map_err(|e| CheckError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        task_results.into_iter().collect()
    }

    /// Check one file with every applicable rule
    pub async fn check_single_file(&self, file_path: &Path) -> FileReport {
        Self::check_single_file_internal(
            file_path.to_path_buf(),
            Arc::clone(&self.rules),
            self.config.check_timeout,
        )
        .await
    }

    async fn check_single_file_internal(
        file_path: PathBuf,
        rules: Arc<RuleSet>,
        timeout: Duration,
    ) -> FileReport {
        let start_time = Instant::now();

        let applicable: Vec<RuleId> = rules.applicable(&file_path).map(|r| r.id()).collect();
        if applicable.is_empty() {
            debug!("No enabled rule applies to {}", file_path.display());
            return FileReport::skipped(file_path, "no enabled rule applies");
        }

        let bytes = match tokio::fs::read(&file_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {}: {}", file_path.display(), e);
                return FileReport::failed(file_path, e.into(), start_time.elapsed());
            }
        };
        // Sources in legacy encodings are still worth scanning
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let blocking_path = file_path.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut report = Report::new();
            for rule in rules.applicable(&blocking_path) {
                rule.check(&blocking_path, &content, &mut report);
            }
            report
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(report)) => FileReport::checked(
                file_path,
                applicable,
                report.into_entries(),
                start_time.elapsed(),
            ),
            Ok(Err(e)) => FileReport::failed(
                file_path,
                CheckError::Concurrency {
                    details: format!("Join error: {}", e),
                },
                start_time.elapsed(),
            ),
            Err(_) => {
                warn!("Check of {} timed out", file_path.display());
                FileReport::failed(
                    file_path.clone(),
                    CheckError::Timeout {
                        file: file_path,
                        timeout_ms: timeout.as_millis() as u64,
                    },
                    timeout,
                )
            }
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }
}
