//! Report locator for discovering retry report files.
//!
//! Walks a build tree and collects every file whose name matches the
//! configured report pattern. A missing root or unreadable subtree is
//! not an error, it simply contributes no reports.

use crate::models::ReportFile;
use std::path::PathBuf;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Default file name pattern written by the JUnit 5 retry listener.
pub const DEFAULT_REPORT_PATTERN: &str = "junit5-retry-report-*.txt";

/// File name pattern with at most one `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPattern {
    prefix: String,
    /// `None` when the pattern has no wildcard and must match exactly.
    suffix: Option<String>,
}

impl ReportPattern {
    /// Parse a pattern such as `junit5-retry-report-*.txt`.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("Report pattern must not be empty".to_string());
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(format!(
                "Report pattern must be a file name, not a path: {}",
                pattern
            ));
        }

        match pattern.split_once('*') {
            Some((prefix, suffix)) => {
                if suffix.contains('*') {
                    return Err(format!(
                        "Report pattern supports a single '*' wildcard: {}",
                        pattern
                    ));
                }
                Ok(Self {
                    prefix: prefix.to_string(),
                    suffix: Some(suffix.to_string()),
                })
            }
            None => Ok(Self {
                prefix: pattern.to_string(),
                suffix: None,
            }),
        }
    }

    /// Check whether a file name matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match &self.suffix {
            None => name == self.prefix,
            Some(suffix) => {
                name.len() >= self.prefix.len() + suffix.len()
                    && name.starts_with(&self.prefix)
                    && name.ends_with(suffix.as_str())
            }
        }
    }
}

impl Default for ReportPattern {
    fn default() -> Self {
        Self {
            prefix: "junit5-retry-report-".to_string(),
            suffix: Some(".txt".to_string()),
        }
    }
}

/// Configuration for report discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Report file name pattern
    pub pattern: ReportPattern,
    /// Directory names never descended into (e.g., ["node_modules"]); empty by default
    pub excludes: Vec<String>,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: ReportPattern::default(),
            excludes: Vec::new(),
            follow_links: false,
        }
    }
}

impl TryFrom<&crate::config::ScannerConfig> for ScanConfig {
    type Error = String;

    fn try_from(config: &crate::config::ScannerConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            pattern: ReportPattern::parse(&config.pattern)?,
            excludes: config.excludes.clone(),
            follow_links: config.follow_links,
        })
    }
}

/// Locator for retry report files under a root directory.
pub struct ReportLocator {
    config: ScanConfig,
    root: PathBuf,
}

impl ReportLocator {
    /// Create a new locator.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Find every matching report file, sorted by path.
    pub fn locate(&self) -> Vec<ReportFile> {
        if !self.root.is_dir() {
            debug!("Search root is not a directory: {}", self.root.display());
            return Vec::new();
        }

        let mut reports: Vec<ReportFile> = WalkDir::new(&self.root)
            .follow_links(self.config.follow_links)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.matches(entry))
            .map(|entry| ReportFile::new(entry.into_path()))
            .collect();

        reports.sort();
        debug!(
            "Found {} report file(s) under {}",
            reports.len(),
            self.root.display()
        );
        reports
    }

    /// Check if an entry's file name matches the report pattern.
    fn matches(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .map(|name| self.config.pattern.matches(name))
            .unwrap_or(false)
    }

    /// Check if a directory is on the exclude list. The root itself is never excluded.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}
