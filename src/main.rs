use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use extcheck::cli::{Cli, VerbosityLevel};
use extcheck::config::{Config, ConfigManager};
use extcheck::engine::{CheckConfig, CheckEngine, CheckProgress, ProgressCallback};
use extcheck::error::CheckError;
use extcheck::error_reporter::ErrorReporter;
use extcheck::file_discovery::FileDiscovery;
use extcheck::manifest::GrammarStore;
use extcheck::output::Output;
use extcheck::rules::RuleSet;

const EXIT_CLEAN: u8 = 0;
const EXIT_FINDINGS: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let cli_verbosity = if cli.quiet {
        VerbosityLevel::Quiet
    } else if cli.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            ErrorReporter::new(cli_verbosity).report_config_error(&e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    init_logging(&config);
    let verbosity = ConfigManager::verbosity(&config);

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_FATAL);
    }

    match run(&cli, &config).await {
        Ok(true) => ExitCode::from(EXIT_FINDINGS),
        Ok(false) => ExitCode::from(EXIT_CLEAN),
        Err(e) => {
            match e.downcast_ref::<CheckError>() {
                Some(check_error) => ErrorReporter::new(verbosity).report_check_error(check_error),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Runs the check and prints the report. `Ok(true)` when errors were found.
async fn run(cli: &Cli, config: &Config) -> anyhow::Result<bool> {
    let verbosity = ConfigManager::verbosity(config);

    let discovery = FileDiscovery::new()
        .with_include_patterns(config.scan.include_patterns.clone())?
        .with_exclude_patterns(config.scan.exclude_patterns.clone())?
        .with_max_depth(config.scan.max_depth);

    let grammars = Arc::new(
        GrammarStore::open(ConfigManager::grammar_source(config)).map_err(CheckError::from)?,
    );
    let settings = ConfigManager::rule_settings(config).map_err(CheckError::from)?;
    let rules = RuleSet::from_settings(&settings, grammars)?;
    debug!("Enabled rules: {:?}", rules.ids());

    let engine = CheckEngine::new(
        rules,
        CheckConfig {
            max_concurrent_checks: ConfigManager::get_thread_count(config),
            check_timeout: ConfigManager::get_timeout_duration(config),
        },
    );

    let progress: Option<ProgressCallback> =
        if verbosity == VerbosityLevel::Verbose && atty::is(atty::Stream::Stderr) {
            let reporter = Arc::new(ErrorReporter::new(verbosity));
            Some(Arc::new(move |progress: CheckProgress| {
                if progress.current_file.is_some() {
                    reporter.report_progress(
                        progress.completed,
                        progress.total,
                        progress.current_file.as_deref(),
                    );
                }
            }))
        } else {
            None
        };

    let results = engine
        .check_path_with_progress(&cli.path, &discovery, progress)
        .await?;

    let rendered = Output::new(config.output.format.into(), verbosity)
        .render(&results)
        .context("Failed to render report")?;
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }

    Ok(results.has_errors())
}
