use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::{CheckError, GrammarError};
use std::path::Path;

/// Error reporter with configurable verbosity
///
/// Writes to stderr only; stdout carries the report.
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    pub fn with_timestamps(verbosity: VerbosityLevel, show_timestamps: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
        }
    }

    /// Report a checker failure with appropriate verbosity
    pub fn report_check_error(&self, error: &CheckError) {
        match self.verbosity {
            VerbosityLevel::Quiet => {
                if self.is_critical_error(error) {
                    eprintln!("{}", self.format_error_brief(error));
                }
            }
            VerbosityLevel::Normal => eprintln!("{}", self.format_error_normal(error)),
            VerbosityLevel::Verbose => eprintln!("{}", self.format_error_verbose(error)),
        }
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Report progress for long-running checks
    pub fn report_progress(&self, current: usize, total: usize, current_file: Option<&Path>) {
        if self.verbosity == VerbosityLevel::Quiet || total == 0 {
            return;
        }

        let percentage = (current as f64 / total as f64 * 100.0) as u32;

        match (self.verbosity, current_file) {
            (VerbosityLevel::Verbose, Some(file)) => eprint!(
                "\rProgress: {}/{} ({}%) - Checked: {}",
                current,
                total,
                percentage,
                file.display()
            ),
            _ => eprint!("\rProgress: {}/{} ({}%)", current, total, percentage),
        }

        if current == total {
            eprintln!();
        }
    }

    /// Errors that are shown even in quiet mode
    fn is_critical_error(&self, error: &CheckError) -> bool {
        matches!(
            error,
            CheckError::Config(_)
                | CheckError::Grammar(_)
                | CheckError::FileSystemTraversal { .. }
                | CheckError::UnknownRule(_)
        )
    }

    fn format_error_brief(&self, error: &CheckError) -> String {
        match error {
            CheckError::FileSystemTraversal { path, .. } => {
                format!("UNREADABLE: {}", path.display())
            }
            CheckError::Timeout { file, .. } => format!("TIMEOUT: {}", file.display()),
            _ => format!("ERROR: {}", error),
        }
    }

    fn format_error_normal(&self, error: &CheckError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    fn format_error_verbose(&self, error: &CheckError) -> String {
        let mut output = self.format_error_normal(error);

        match error {
            CheckError::FileSystemTraversal { path, .. } => {
                output.push_str(&format!(
                    "\nSuggestion: Check that {} exists and is readable",
                    path.display()
                ));
            }
            CheckError::Timeout { timeout_ms, .. } => {
                output.push_str(&format!(
                    "\nSuggestion: Raise --timeout (currently {}ms) or exclude the file",
                    timeout_ms
                ));
            }
            CheckError::Grammar(GrammarError::UnknownMode { .. }) => {
                output.push_str("\nSuggestion: Child modes must be one of '!', '=', '?' or '*'");
            }
            CheckError::Grammar(_) => {
                output.push_str(
                    "\nSuggestion: Check the grammar directory or drop --grammar-dir to use the bundled grammars",
                );
            }
            CheckError::UnknownRule(_) => {
                output.push_str("\nSuggestion: Known rules are manifest, encoding and jexec");
            }
            _ => {}
        }

        output.push_str(&format!("\nDebug Info: {:?}", error));
        output
    }

    fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal => {
                format!(
                    "Configuration Error: {}\n{}",
                    error,
                    self.get_config_help(error)
                )
            }
            VerbosityLevel::Verbose => {
                format!(
                    "Configuration Error: {}\nDebug: {:?}\n{}",
                    error,
                    error,
                    self.get_config_help(error)
                )
            }
        }
    }

    /// Get helpful suggestions for configuration errors
    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::UnsupportedFormat(_) => {
                "Use a .toml or .json configuration file".to_string()
            }
            ConfigError::Environment(_) => {
                "Fix or unset the EXTCHECK_* environment variable named above".to_string()
            }
            ConfigError::Validation(_) => {
                "Fix the value in the configuration file, environment or command line".to_string()
            }
        }
    }
}
