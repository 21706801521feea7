//! # extcheck Library
//!
//! Static checks for CMS extension packages: XML manifests are validated
//! against per-type grammars, PHP sources are scanned for encoded payloads
//! and for a missing direct access guard. Files are checked concurrently.

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod manifest;
pub mod output;
pub mod report;
pub mod rules;

pub use cache::{CacheStats, GrammarCache};
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager};
pub use engine::{
    CheckConfig, CheckEngine, CheckPhase, CheckProgress, CheckResults, FileReport, FileStatus,
    ProgressCallback,
};
pub use error::{CheckError, GrammarError};
pub use error_reporter::ErrorReporter;
pub use file_discovery::{DiscoveryStats, FileDiscovery};
pub use manifest::{
    Diagnostic, DiagnosticBucket, ExtensionType, Finding, Grammar, GrammarSource, GrammarStore,
    HookRegistry, ManifestValidator, XmlElement,
};
pub use output::Output;
pub use report::{Report, ReportEntry, ReportSink, Severity};
pub use rules::{Rule, RuleId, RuleSet, RuleSettings};
