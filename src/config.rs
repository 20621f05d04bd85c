//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.flakyagg.toml` files.

use crate::analysis::DEFAULT_MODULE_DEPTH;
use crate::scanner::DEFAULT_REPORT_PATTERN;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".flakyagg.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report discovery settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the JSON summary.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "flaky-tests-summary.json".to_string()
}

/// Report discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directory searched for reports.
    #[serde(default = "default_root")]
    pub root: String,

    /// Report file name pattern (single `*` wildcard).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Directory levels between a report file and its module directory.
    #[serde(default = "default_module_depth")]
    pub module_depth: usize,

    /// Directory names never searched.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Follow symbolic links while searching.
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            pattern: default_pattern(),
            module_depth: default_module_depth(),
            excludes: default_excludes(),
            follow_links: false,
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}

fn default_pattern() -> String {
    DEFAULT_REPORT_PATTERN.to_string()
}

fn default_module_depth() -> usize {
    DEFAULT_MODULE_DEPTH
}

fn default_excludes() -> Vec<String> {
    Vec::new()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Optional Markdown report path.
    #[serde(default)]
    pub markdown: Option<String>,

    /// List every discovered report file on the console.
    #[serde(default = "default_true")]
    pub show_report_files: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            markdown: None,
            show_report_files: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user passed explicitly override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.root {
            self.scanner.root = root.to_string_lossy().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }
        if let Some(ref pattern) = args.pattern {
            self.scanner.pattern = pattern.clone();
        }
        if let Some(depth) = args.module_depth {
            self.scanner.module_depth = depth;
        }
        if let Some(ref markdown) = args.markdown {
            self.report.markdown = Some(markdown.to_string_lossy().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that serde cannot validate on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.scanner.module_depth == 0 {
            return Err("Module depth must be at least 1".to_string());
        }
        if self.general.output.trim().is_empty() {
            return Err("Output path must not be empty".to_string());
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
