use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use extcheck::{
    CheckResults, FileReport, Output, OutputFormat, ReportEntry, RuleId, Severity, VerbosityLevel,
};

fn results() -> CheckResults {
    let manifest = Path::new("mod_hello.xml");
    CheckResults::aggregate(
        Utc::now(),
        vec![
            FileReport::checked(
                manifest.to_path_buf(),
                vec![RuleId::Manifest],
                vec![
                    ReportEntry::new(manifest, Severity::Error, "<extension>: missing attribute client"),
                    ReportEntry::new(
                        manifest,
                        Severity::Warning,
                        "<extension>: method=\"upgrade\" is not set, updates will fail",
                    ),
                ],
                Duration::from_millis(2),
            ),
            FileReport::skipped(PathBuf::from("notes.xml"), "no enabled rule applies"),
        ],
    )
}

#[test]
fn test_human_normal() {
    let text = Output::new(OutputFormat::Human, VerbosityLevel::Normal)
        .with_colors(false)
        .render(&results())
        .unwrap();

    assert!(text.starts_with("mod_hello.xml: error: <extension>: missing attribute client\n"));
    assert!(text.contains("mod_hello.xml: warning: <extension>: method=\"upgrade\""));
    assert!(text.contains("  Skipped: 1\n"));
    // Skip reasons are verbose-only
    assert!(!text.contains("no enabled rule applies"));
}

#[test]
fn test_human_verbose_shows_skips() {
    let text = Output::new(OutputFormat::Human, VerbosityLevel::Verbose)
        .with_colors(false)
        .render(&results())
        .unwrap();
    assert!(text.contains("- SKIPPED  notes.xml"));
    assert!(text.contains("    no enabled rule applies"));
}

#[test]
fn test_colors() {
    let text = Output::new(OutputFormat::Human, VerbosityLevel::Normal)
        .with_colors(true)
        .render(&results())
        .unwrap();
    assert!(text.contains("\x1b[31merror\x1b[0m"));
}

#[test]
fn test_json_round_trips_counts() {
    let text = Output::new(OutputFormat::Json, VerbosityLevel::Normal)
        .render(&results())
        .unwrap();
    let parsed: CheckResults = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.total_files, 2);
    assert_eq!(parsed.error_count, 1);
    assert_eq!(parsed.warning_count, 1);
    assert_eq!(parsed.skipped_files, 1);
    assert_eq!(parsed.file_results[0].entries[0].severity, Severity::Error);
}
