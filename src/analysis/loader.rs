//! Retry report loading.
//!
//! Each report file is parsed into tagged [`TestRecord`]s independently.
//! A file that cannot be read or parsed becomes a [`LoadOutcome::Failed`]
//! so that one bad report never aborts the rest of the run.

use crate::models::{RawTestRecord, ReportFile, TestRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Module name used when a report sits too close to the filesystem root.
pub const UNKNOWN_MODULE: &str = "unknown";

/// Default number of directory levels between a report and its module.
///
/// The listener writes to `<module>/target/junit5-retry-report-*.txt`.
pub const DEFAULT_MODULE_DEPTH: usize = 2;

/// Reasons a single report file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid report content: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Result of loading one report file.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        file: ReportFile,
        records: Vec<TestRecord>,
    },
    Failed {
        file: ReportFile,
        error: LoadError,
    },
}

impl LoadOutcome {
    /// Records of a successful load; empty for a failure.
    pub fn records(&self) -> &[TestRecord] {
        match self {
            LoadOutcome::Loaded { records, .. } => records,
            LoadOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }

    /// Warning line for a failed load, naming the file and the reason.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            LoadOutcome::Loaded { .. } => None,
            LoadOutcome::Failed { file, error } => {
                Some(format!("Failed to load {}: {}", file, error))
            }
        }
    }
}

/// Derive the module a report belongs to from its location.
///
/// The module is the name of the directory `depth` levels above the file,
/// so with a depth of 2 `order-service/target/report.txt` belongs to
/// `order-service`. Paths too shallow for the depth yield [`UNKNOWN_MODULE`].
pub fn derive_module_from_report_path(path: &Path, depth: usize) -> String {
    path.ancestors()
        .nth(depth)
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| UNKNOWN_MODULE.to_string())
}

/// Parse report content into raw records, validating each entry.
pub fn parse_report(content: &str) -> Result<Vec<RawTestRecord>, LoadError> {
    let records: Vec<RawTestRecord> = serde_json::from_str(content)?;

    if let Some(index) = records.iter().position(|r| r.execution_count == 0) {
        return Err(LoadError::InvalidRecord {
            index,
            reason: "executionCount must be at least 1".to_string(),
        });
    }

    Ok(records)
}

/// Loader that turns report files into tagged records.
#[derive(Debug, Clone)]
pub struct ReportLoader {
    module_depth: usize,
    show_progress: bool,
}

impl Default for ReportLoader {
    fn default() -> Self {
        Self {
            module_depth: DEFAULT_MODULE_DEPTH,
            show_progress: false,
        }
    }
}

impl ReportLoader {
    /// Create a new loader.
    pub fn new(module_depth: usize, show_progress: bool) -> Self {
        Self {
            module_depth,
            show_progress,
        }
    }

    /// Load a single report file. Never fails; errors are captured in the outcome.
    pub fn load(&self, file: ReportFile) -> LoadOutcome {
        let outcome = match self.try_load(&file) {
            Ok(records) => {
                debug!("Loaded {} record(s) from {}", records.len(), file);
                LoadOutcome::Loaded { file, records }
            }
            Err(error) => LoadOutcome::Failed { file, error },
        };

        if let Some(message) = outcome.diagnostic() {
            warn!("{}", message);
        }
        outcome
    }

    /// Load every report file in order.
    pub fn load_all(&self, files: Vec<ReportFile>) -> Vec<LoadOutcome> {
        let progress = self.progress_bar(files.len() as u64);

        let outcomes: Vec<LoadOutcome> = files
            .into_iter()
            .map(|file| {
                progress.set_message(file.to_string());
                let outcome = self.load(file);
                progress.inc(1);
                outcome
            })
            .collect();

        progress.finish_and_clear();
        debug!(
            "Loaded {} record(s) in total",
            outcomes.iter().map(|o| o.records().len()).sum::<usize>()
        );
        outcomes
    }

    fn try_load(&self, file: &ReportFile) -> Result<Vec<TestRecord>, LoadError> {
        let content = fs::read_to_string(file.path())?;
        let raw = parse_report(&content)?;

        let module = derive_module_from_report_path(file.path(), self.module_depth);
        let report_file = file.path().to_string_lossy().to_string();

        Ok(raw
            .into_iter()
            .map(|r| TestRecord::tagged(r, &module, &report_file))
            .collect())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress || len < 2 {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
