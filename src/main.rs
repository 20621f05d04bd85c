//! Flakyagg - JUnit 5 flaky test report aggregator
//!
//! Finds the per-module retry reports left behind by a multi-module
//! build, merges them and writes a single JSON summary.
//!
//! Exit codes:
//!   0 - Success (whether or not flaky tests were found)
//!   1 - Invalid arguments/config, or the summary could not be written

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod scanner;

use analysis::{LoadStats, ReportLoader};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use models::{ReportFile, Summary};
use scanner::{ReportLocator, ScanConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so config verbosity applies
    let (config, config_warning) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("Flakyagg v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(warning) = config_warning {
        warn!("{}", warning);
    }

    if let Err(e) = run(&config, args.quiet) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .flakyagg.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        return Err(anyhow!(
            "{} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        ));
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to customize the search root, report pattern and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries the summary.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// A broken config at the default location falls back to defaults and
/// yields a warning to log once logging is up.
fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    let (mut config, warning) = if let Some(ref config_path) = args.config {
        (Config::load(config_path)?, None)
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, None),
            Ok(None) => (Config::default(), None),
            Err(e) => (
                Config::default(),
                Some(format!("Failed to load config, using defaults: {:#}", e)),
            ),
        }
    };

    config.merge_with_args(args);
    config.validate().map_err(|e| anyhow!(e))?;

    Ok((config, warning))
}

/// Result of locating, loading and aggregating reports.
struct Aggregation {
    reports: Vec<ReportFile>,
    summary: Summary,
    stats: LoadStats,
}

/// Locate, load and aggregate every report under the configured root.
fn aggregate_reports(config: &Config, show_progress: bool) -> Result<Aggregation> {
    let scan_config = ScanConfig::try_from(&config.scanner).map_err(|e| anyhow!(e))?;
    let root = PathBuf::from(&config.scanner.root);

    let reports = ReportLocator::new(root, scan_config).locate();
    info!("Found {} report file(s)", reports.len());

    let loader = ReportLoader::new(config.scanner.module_depth, show_progress);
    let outcomes = loader.load_all(reports.clone());
    let (summary, stats) = analysis::aggregate(outcomes, Utc::now());
    info!("Loaded {} of {} report file(s)", stats.loaded, stats.found);

    Ok(Aggregation {
        reports,
        summary,
        stats,
    })
}

/// Run the complete discovery, aggregation and reporting workflow.
fn run(config: &Config, quiet: bool) -> Result<Summary> {
    println!("🔍 Searching for flaky test reports...");

    let aggregation = aggregate_reports(config, !quiet)?;

    if aggregation.reports.is_empty() || config.report.show_report_files {
        print!(
            "{}",
            report::generate_discovery_section(&aggregation.reports)
        );
    } else {
        println!("Found {} report file(s)", aggregation.reports.len());
    }

    if !aggregation.reports.is_empty() {
        println!("\n📊 Aggregating reports...");
        print!(
            "{}",
            report::generate_console_report(&aggregation.summary, &aggregation.stats)
        );
    }

    let output = PathBuf::from(&config.general.output);
    report::write_json_summary(&aggregation.summary, &output)?;

    if let Some(ref markdown) = config.report.markdown {
        let markdown = PathBuf::from(markdown);
        report::write_markdown_report(&aggregation.summary, &markdown)?;
        println!("📝 Markdown report written to: {}", markdown.display());
    }

    println!("\n✅ Aggregated summary written to: {}", output.display());

    Ok(aggregation.summary)
}
