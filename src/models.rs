//! Data models for the flaky test aggregator.
//!
//! This module contains the core data structures used throughout the
//! pipeline: discovered report files, raw and tagged test records,
//! per-module statistics and the persisted summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Field name injected by the loader for the originating module.
pub const MODULE_FIELD: &str = "module";

/// Field name injected by the loader for the originating report file.
pub const REPORT_FILE_FIELD: &str = "reportFile";

/// A discovered retry report on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportFile {
    path: PathBuf,
}

impl ReportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ReportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// One entry as written by the retry listener.
///
/// Only `testName` and `executionCount` are required. Everything else the
/// listener writes (`status`, `lastFailure`, ...) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestRecord {
    pub test_name: String,
    pub execution_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A flaky test occurrence tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Fully qualified or display name of the retried test.
    pub test_name: String,
    /// Number of attempts made before the outcome stabilized.
    pub execution_count: u32,
    /// Fields passed through unchanged from the source entry.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Module the report file belongs to.
    pub module: String,
    /// Path of the report file this record was read from.
    pub report_file: String,
}

impl TestRecord {
    /// Tag a raw entry with its module and report file.
    ///
    /// Source keys that collide with the injected fields are dropped.
    pub fn tagged(raw: RawTestRecord, module: &str, report_file: &str) -> Self {
        let mut extra = raw.extra;
        extra.remove(MODULE_FIELD);
        extra.remove(REPORT_FILE_FIELD);

        Self {
            test_name: raw.test_name,
            execution_count: raw.execution_count,
            extra,
            module: module.to_string(),
            report_file: report_file.to_string(),
        }
    }
}

/// Statistics for the records of a single module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub count: usize,
    pub avg_execution_count: f64,
    /// Test names in encounter order, duplicates included.
    pub tests: Vec<String>,
}

impl ModuleStats {
    /// Compute statistics over a non-empty group of records.
    ///
    /// Returns `None` for an empty group, which has no defined average.
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TestRecord>,
    {
        let mut count = 0usize;
        let mut total: u64 = 0;
        let mut tests = Vec::new();

        for record in records {
            count += 1;
            total += u64::from(record.execution_count);
            tests.push(record.test_name.clone());
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            count,
            avg_execution_count: total as f64 / count as f64,
            tests,
        })
    }
}

/// The aggregated, cross-module view persisted at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Generation time of this summary.
    pub timestamp: DateTime<Utc>,
    pub total_flaky_tests: usize,
    pub module_count: usize,
    /// Per-module statistics, ordered by module name.
    pub modules: BTreeMap<String, ModuleStats>,
    /// Every record in discovery order.
    pub tests: Vec<TestRecord>,
}

impl Summary {
    /// Summary for a run that found no flaky tests.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total_flaky_tests: 0,
            module_count: 0,
            modules: BTreeMap::new(),
            tests: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Records belonging to `module`, in discovery order.
    pub fn records_for_module<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = &'a TestRecord> + 'a {
        self.tests.iter().filter(move |t| t.module == module)
    }
}
