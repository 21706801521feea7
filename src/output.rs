//! Output and reporting
//!
//! Renders [`CheckResults`] as human-readable text, JSON or a short summary.

use std::fmt::Write as _;
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::engine::{CheckResults, FileReport, FileStatus};
use crate::report::{ReportEntry, Severity};

/// Output formatter for check results
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let color = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Notice => "36",
        };
        self.colorize(severity.label(), color)
    }

    /// Render results in the configured format
    pub fn render(&self, results: &CheckResults) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_results(results)),
            OutputFormat::Json => self.format_json(results),
            OutputFormat::Summary => Ok(self.format_summary(results)),
        }
    }

    pub fn format_results(&self, results: &CheckResults) -> String {
        let mut output = String::new();

        match self.verbosity {
            VerbosityLevel::Quiet => {
                for file_result in &results.file_results {
                    for entry in file_result
                        .entries
                        .iter()
                        .filter(|e| e.severity == Severity::Error)
                    {
                        output.push_str(&self.format_entry(entry));
                    }
                    if let FileStatus::Failed { message } = &file_result.status {
                        output.push_str(&self.format_failure(file_result, message));
                    }
                }
                if results.has_errors() {
                    let _ = writeln!(
                        output,
                        "Errors: {} Failed: {}",
                        results.error_count, results.failed_files
                    );
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                for file_result in &results.file_results {
                    output.push_str(&self.format_file_result(file_result));
                }
                if !results.file_results.is_empty() {
                    output.push('\n');
                }
                output.push_str(&self.format_summary(results));
            }
        }

        output
    }

    /// Entries of one file, plus a status line in verbose mode
    pub fn format_file_result(&self, result: &FileReport) -> String {
        let mut output = String::new();

        if self.verbosity >= VerbosityLevel::Verbose {
            let status = match &result.status {
                FileStatus::Checked if result.entries.is_empty() => self.colorize("✓ CLEAN", "32"),
                FileStatus::Checked => self.colorize("✗ FINDINGS", "31"),
                FileStatus::Skipped { .. } => self.colorize("- SKIPPED", "36"),
                FileStatus::Failed { .. } => self.colorize("⚠ FAILED", "33"),
            };
            let _ = writeln!(
                output,
                "{}  {} ({})",
                status,
                result.path.display(),
                format_duration(result.duration)
            );
        }

        for entry in &result.entries {
            output.push_str(&self.format_entry(entry));
        }

        match &result.status {
            FileStatus::Failed { message } => {
                output.push_str(&self.format_failure(result, message));
            }
            FileStatus::Skipped { reason } if self.verbosity >= VerbosityLevel::Verbose => {
                let _ = writeln!(output, "    {}", reason);
            }
            _ => {}
        }

        output
    }

    /// `path[:line]: severity: message`, continuation lines indented
    pub fn format_entry(&self, entry: &ReportEntry) -> String {
        let mut output = String::new();
        let location = match entry.line {
            Some(line) => format!("{}:{}", entry.file.display(), line),
            None => entry.file.display().to_string(),
        };

        let mut lines = entry.message.lines();
        let first = lines.next().unwrap_or_default();
        let _ = writeln!(
            output,
            "{}: {}: {}",
            location,
            self.severity_label(entry.severity),
            first
        );
        for line in lines {
            let _ = writeln!(output, "    {}", line);
        }

        if self.verbosity >= VerbosityLevel::Verbose
            && let Some(code) = &entry.code
        {
            let _ = writeln!(output, "    | {}", code.trim());
        }

        output
    }

    fn format_failure(&self, result: &FileReport, message: &str) -> String {
        format!(
            "{}: {}: {}\n",
            result.path.display(),
            self.colorize("failed", "33"),
            message
        )
    }

    pub fn format_summary(&self, results: &CheckResults) -> String {
        let mut output = String::new();
        output.push_str("Check Summary:\n");
        let _ = writeln!(output, "  Total files: {}", results.total_files);
        let _ = writeln!(output, "  Checked: {}", results.checked_files);

        if results.skipped_files > 0 {
            let _ = writeln!(
                output,
                "  {} {}",
                self.colorize("Skipped:", "36"),
                results.skipped_files
            );
        }
        if results.failed_files > 0 {
            let _ = writeln!(
                output,
                "  {} {}",
                self.colorize("Failed:", "33"),
                results.failed_files
            );
        }

        let _ = writeln!(
            output,
            "  {} {}",
            self.colorize("Errors:", "31"),
            results.error_count
        );
        let _ = writeln!(
            output,
            "  {} {}",
            self.colorize("Warnings:", "33"),
            results.warning_count
        );
        let _ = writeln!(
            output,
            "  {} {}",
            self.colorize("Notices:", "36"),
            results.notice_count
        );
        let _ = writeln!(
            output,
            "  Duration: {}",
            format_duration(results.total_duration)
        );

        if self.verbosity >= VerbosityLevel::Verbose {
            let _ = writeln!(
                output,
                "  Discovery: {}",
                format_duration(results.discovery_duration)
            );
            let _ = writeln!(
                output,
                "  Started: {}",
                results.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        output
    }

    /// Pretty JSON; quiet mode keeps only error entries
    pub fn format_json(&self, results: &CheckResults) -> serde_json::Result<String> {
        if self.verbosity == VerbosityLevel::Quiet {
            let mut filtered = results.clone();
            for file_result in &mut filtered.file_results {
                file_result.entries.retain(|e| e.severity == Severity::Error);
            }
            return serde_json::to_string_pretty(&filtered);
        }
        serde_json::to_string_pretty(results)
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
