//! Command-line interface argument parsing.
//!
//! Every argument is optional: a bare invocation searches the current
//! directory and writes `flaky-tests-summary.json` next to it.

use clap::Parser;
use std::path::PathBuf;

/// Flakyagg - aggregate JUnit 5 retry reports into one flaky test summary
///
/// Finds every junit5-retry-report-*.txt below the search root, groups the
/// retried tests by module and writes a JSON summary. The exit code is 0
/// whether or not flaky tests were found.
///
/// Examples:
///   flakyagg
///   flakyagg --root ./services --output build/flaky-tests-summary.json
///   flakyagg --markdown flaky-tests.md
///   flakyagg --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory to search for retry reports
    ///
    /// Defaults to the current directory or `scanner.root` from the config file.
    #[arg(long, value_name = "DIR", env = "FLAKYAGG_ROOT")]
    pub root: Option<PathBuf>,

    /// Output file path for the JSON summary
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report file name pattern (single '*' wildcard)
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Directory levels between a report file and its module directory
    #[arg(long, value_name = "LEVELS")]
    pub module_depth: Option<usize>,

    /// Also write a Markdown report to this path
    #[arg(long, value_name = "FILE")]
    pub markdown: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .flakyagg.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .flakyagg.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.module_depth == Some(0) {
            return Err("Module depth must be at least 1".to_string());
        }

        if let Some(ref pattern) = self.pattern {
            crate::scanner::ReportPattern::parse(pattern)?;
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!(
                    "Output path is a directory: {}",
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
