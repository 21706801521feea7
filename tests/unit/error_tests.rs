use std::path::PathBuf;

use extcheck::config::ConfigError;
use extcheck::{CheckError, GrammarError, RuleId};

#[test]
fn test_check_error_display() {
    let error = CheckError::FileSystemTraversal {
        path: PathBuf::from("/ext"),
        reason: "No such file or directory".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "File system traversal error: /ext - No such file or directory"
    );

    let error = CheckError::Timeout {
        file: PathBuf::from("big.php"),
        timeout_ms: 1500,
    };
    assert_eq!(error.to_string(), "Check timed out: big.php after 1500ms");
}

#[test]
fn test_grammar_error_converts() {
    let grammar_error = GrammarError::UnknownMode {
        ruleset: "extension".to_string(),
        child: "name".to_string(),
        mode: "+".to_string(),
    };
    let error: CheckError = grammar_error.clone().into();
    assert!(matches!(error, CheckError::Grammar(ref e) if *e == grammar_error));
    assert_eq!(
        error.to_string(),
        "Grammar error: Unknown child mode '+' for <name> in ruleset 'extension'"
    );
}

#[test]
fn test_config_error_converts() {
    let error: CheckError = ConfigError::Validation("Timeout must be greater than 0".to_string()).into();
    assert!(matches!(error, CheckError::Config(ref m) if m.contains("Timeout")));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: CheckError = io.into();
    assert!(error.to_string().starts_with("IO error:"));
}

#[test]
fn test_unknown_rule_from_parse() {
    match "lint".parse::<RuleId>() {
        Err(CheckError::UnknownRule(name)) => assert_eq!(name, "lint"),
        other => panic!("Expected unknown rule, got {other:?}"),
    }
    assert_eq!(" JEXEC ".parse::<RuleId>().unwrap(), RuleId::Jexec);
}
