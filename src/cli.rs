use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only errors and the final count
    Quiet,
    /// Every finding
    #[default]
    Normal,
    /// Findings plus timings and per-file detail
    Verbose,
}

/// Report format written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Summary,
}

/// Static checker for CMS extension packages
#[derive(Parser, Debug, Clone)]
#[command(name = "extcheck")]
#[command(
    about = "Check an extension package: XML manifests against their grammar, encoded code and direct access guards"
)]
#[command(version)]
pub struct Cli {
    /// Extension directory or single file to check
    #[arg(help = "Directory or file to check")]
    pub path: PathBuf,

    /// Rules to run (comma-separated: manifest,encoding,jexec)
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<String>,

    /// Number of concurrent checks
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth to descend into
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Directory holding dtd_<type>.json grammar documents
    #[arg(long = "grammar-dir")]
    pub grammar_dir: Option<PathBuf>,

    /// Encoding functions to flag (comma-separated)
    #[arg(long = "encodings")]
    pub encodings: Option<String>,

    /// Constants accepted in direct access guards (comma-separated)
    #[arg(long = "constants")]
    pub constants: Option<String>,

    /// Per-file check timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Log filter, e.g. "debug" or "extcheck=trace"
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_rules(&self) -> Option<Vec<String>> {
        self.rules.as_deref().map(split_list)
    }

    pub fn get_encodings(&self) -> Option<Vec<String>> {
        self.encodings.as_deref().map(split_list)
    }

    pub fn get_constants(&self) -> Option<Vec<String>> {
        self.constants.as_deref().map(split_list)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.path.exists() {
            return Err(format!("Path does not exist: {}", self.path.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Split a comma-separated list, dropping blank items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
