use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::manifest::GrammarSource;
use crate::rules::{RuleId, RuleSettings, access_guard, encoding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub rules: RulesConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Which files are checked and how
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of concurrent checks
    pub threads: Option<usize>,
    /// Per-file check timeout in seconds
    pub timeout_seconds: u64,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Rule selection and rule parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule ids to run
    pub enabled: Vec<String>,
    /// Function names flagged by the encoding rule
    pub encodings: Vec<String>,
    /// Constants accepted by the access guard rule
    pub constants: Vec<String>,
    /// Grammar directory replacing the bundled grammars
    pub grammar_dir: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive
    pub level: String,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
    Summary,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
            OutputFormatConfig::Summary => OutputFormat::Summary,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: None,
            timeout_seconds: 30,
            include_patterns: vec![],
            exclude_patterns: vec![],
            max_depth: None,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: RuleId::ALL.iter().map(|id| id.to_string()).collect(),
            encodings: encoding::DEFAULT_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            constants: access_guard::DEFAULT_CONSTANTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            grammar_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

const CONFIG_NAMES: [&str; 4] = [
    "extcheck.toml",
    "extcheck.json",
    ".extcheck.toml",
    ".extcheck.json",
];

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut dirs_to_search = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            dirs_to_search.push(config_dir.join("extcheck"));
        }

        for dir in dirs_to_search {
            if let Some(config) = Self::find_config_in(&dir).await? {
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// First standard configuration file found in `dir`
    pub async fn find_config_in(dir: &Path) -> Result<Option<Config>> {
        for name in &CONFIG_NAMES {
            let path = dir.join(name);
            if path.exists() {
                tracing::debug!("Using configuration file {}", path.display());
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }
        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Scan settings
        if let Some(threads) = env.get("EXTCHECK_THREADS") {
            config.scan.threads = Some(parse_env("EXTCHECK_THREADS", &threads)?);
        }

        if let Some(timeout) = env.get("EXTCHECK_TIMEOUT") {
            config.scan.timeout_seconds = parse_env("EXTCHECK_TIMEOUT", &timeout)?;
        }

        // Rule settings
        if let Some(rules) = env.get("EXTCHECK_RULES") {
            config.rules.enabled = crate::cli::split_list(&rules);
        }

        if let Some(encodings) = env.get("EXTCHECK_ENCODINGS") {
            config.rules.encodings = crate::cli::split_list(&encodings);
        }

        if let Some(constants) = env.get("EXTCHECK_CONSTANTS") {
            config.rules.constants = crate::cli::split_list(&constants);
        }

        if let Some(grammar_dir) = env.get("EXTCHECK_GRAMMAR_DIR") {
            config.rules.grammar_dir = Some(PathBuf::from(grammar_dir));
        }

        // Output settings
        if let Some(verbose) = env.get("EXTCHECK_VERBOSE") {
            config.output.verbose = parse_env("EXTCHECK_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("EXTCHECK_QUIET") {
            config.output.quiet = parse_env("EXTCHECK_QUIET", &quiet)?;
        }

        if let Some(format) = env.get("EXTCHECK_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                "summary" => OutputFormatConfig::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid EXTCHECK_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        if let Some(level) = env.get("EXTCHECK_LOG") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    ///
    /// Only flags that were actually given override the configuration.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.threads.is_some() {
            config.scan.threads = cli.threads;
        }
        if let Some(timeout) = cli.timeout {
            config.scan.timeout_seconds = timeout;
        }
        if !cli.include_patterns.is_empty() {
            config.scan.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.scan.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.max_depth.is_some() {
            config.scan.max_depth = cli.max_depth;
        }

        if let Some(rules) = cli.get_rules() {
            config.rules.enabled = rules;
        }
        if let Some(encodings) = cli.get_encodings() {
            config.rules.encodings = encodings;
        }
        if let Some(constants) = cli.get_constants() {
            config.rules.constants = constants;
        }
        if let Some(grammar_dir) = &cli.grammar_dir {
            config.rules.grammar_dir = Some(grammar_dir.clone());
        }

        if let Some(format) = cli.format {
            config.output.format = format.into();
        }
        // Either flag settles verbosity on its own
        if cli.verbose || cli.quiet {
            config.output.verbose = cli.verbose;
            config.output.quiet = cli.quiet;
        }

        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }

    /// Merge two configurations (second takes precedence for non-None values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        if override_config.scan.threads.is_some() {
            base.scan.threads = override_config.scan.threads;
        }
        base.scan.timeout_seconds = override_config.scan.timeout_seconds;
        if !override_config.scan.include_patterns.is_empty() {
            base.scan.include_patterns = override_config.scan.include_patterns;
        }
        if !override_config.scan.exclude_patterns.is_empty() {
            base.scan.exclude_patterns = override_config.scan.exclude_patterns;
        }
        if override_config.scan.max_depth.is_some() {
            base.scan.max_depth = override_config.scan.max_depth;
        }

        base.rules.enabled = override_config.rules.enabled;
        base.rules.encodings = override_config.rules.encodings;
        base.rules.constants = override_config.rules.constants;
        if override_config.rules.grammar_dir.is_some() {
            base.rules.grammar_dir = override_config.rules.grammar_dir;
        }

        base.output = override_config.output;
        base.logging = override_config.logging;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.scan.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.scan.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.rules.enabled.is_empty() {
            return Err(ConfigError::Validation(
                "At least one rule must be enabled".to_string(),
            ));
        }
        Self::enabled_rules(config)?;

        Ok(())
    }

    /// Enabled rule ids, in configured order
    pub fn enabled_rules(config: &Config) -> Result<Vec<RuleId>> {
        config
            .rules
            .enabled
            .iter()
            .map(|name| {
                name.parse::<RuleId>()
                    .map_err(|e| ConfigError::Validation(e.to_string()))
            })
            .collect()
    }

    /// Settings the rule set is built from
    pub fn rule_settings(config: &Config) -> Result<RuleSettings> {
        Ok(RuleSettings {
            enabled: Self::enabled_rules(config)?,
            encodings: config.rules.encodings.clone(),
            constants: config.rules.constants.clone(),
        })
    }

    pub fn grammar_source(config: &Config) -> GrammarSource {
        match &config.rules.grammar_dir {
            Some(dir) => GrammarSource::Directory(dir.clone()),
            None => GrammarSource::Bundled,
        }
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &Config) -> usize {
        config.scan.threads.unwrap_or_else(num_cpus::get)
    }

    /// Per-file check timeout
    pub fn get_timeout_duration(config: &Config) -> Duration {
        Duration::from_secs(config.scan.timeout_seconds)
    }

    pub fn verbosity(config: &Config) -> VerbosityLevel {
        if config.output.quiet {
            VerbosityLevel::Quiet
        } else if config.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}
