use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use extcheck::config::{EnvProvider, OutputFormatConfig};
use extcheck::manifest::GrammarSource;
use extcheck::{Cli, Config, ConfigError, ConfigManager, RuleId};

struct MapEnv(HashMap<&'static str, &'static str>);

impl EnvProvider for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| v.to_string())
    }
}

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["extcheck"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(ConfigManager::validate_config(&config).is_ok());
    assert_eq!(
        ConfigManager::enabled_rules(&config).unwrap(),
        vec![RuleId::Manifest, RuleId::Encoding, RuleId::Jexec]
    );
}

#[tokio::test]
async fn test_file_then_env_then_cli() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("checks.json");
    std::fs::write(
        &config_path,
        r#"{
            "scan": { "threads": 2, "exclude_patterns": ["**/vendor/**"] },
            "rules": { "enabled": ["manifest"], "grammar_dir": "/srv/grammars" },
            "output": { "format": "json" }
        }"#,
    )
    .unwrap();

    let env = MapEnv(HashMap::from([
        ("EXTCHECK_RULES", "manifest,jexec"),
        ("EXTCHECK_FORMAT", "summary"),
    ]));
    let cli = cli(&[
        "--config",
        config_path.to_str().unwrap(),
        "--format",
        "human",
        temp_dir.path().to_str().unwrap(),
    ]);

    let config = ConfigManager::load_config_with(&cli, &env).await.unwrap();

    assert_eq!(config.scan.threads, Some(2));
    assert_eq!(config.scan.exclude_patterns, vec!["**/vendor/**"]);
    assert_eq!(config.rules.enabled, vec!["manifest", "jexec"]);
    assert_eq!(config.output.format, OutputFormatConfig::Human);
    assert_eq!(
        ConfigManager::grammar_source(&config),
        GrammarSource::Directory(PathBuf::from("/srv/grammars"))
    );
}

#[tokio::test]
async fn test_unknown_rule_in_env_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let env = MapEnv(HashMap::from([("EXTCHECK_RULES", "manifest,style")]));
    let cli = cli(&[temp_dir.path().to_str().unwrap()]);

    match ConfigManager::load_config_with(&cli, &env).await {
        Err(ConfigError::Validation(message)) => assert!(message.contains("style")),
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_config_file_is_io_error() {
    let cli = cli(&["--config", "/nonexistent/extcheck.toml", "."]);
    let env = MapEnv(HashMap::new());
    assert!(matches!(
        ConfigManager::load_config_with(&cli, &env).await,
        Err(ConfigError::Io(_))
    ));
}

#[tokio::test]
async fn test_extensionless_file_falls_back_to_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("extcheckrc");
    std::fs::write(&path, r#"{ "scan": { "max_depth": 4 } }"#).unwrap();

    let config = ConfigManager::load_from_file(&path).await.unwrap();
    assert_eq!(config.scan.max_depth, Some(4));
}

#[test]
fn test_config_serializes_back_to_toml() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("[rules]"));
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
