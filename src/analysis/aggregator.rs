//! Flaky test aggregation and statistics.
//!
//! This module merges the records of all loaded reports, groups them by
//! module and computes the summary statistics. Apart from debug logging
//! everything here is pure: the generation time is passed in by the caller.

use super::loader::LoadOutcome;
use crate::models::{ModuleStats, Summary, TestRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Counts of report files by load result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub found: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadStats {
    pub fn from_outcomes(outcomes: &[LoadOutcome]) -> Self {
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        Self {
            found: outcomes.len(),
            loaded: outcomes.len() - failed,
            failed,
        }
    }
}

/// Concatenate the records of every successful load, preserving order.
pub fn merge_records(outcomes: Vec<LoadOutcome>) -> Vec<TestRecord> {
    outcomes
        .into_iter()
        .flat_map(|outcome| match outcome {
            LoadOutcome::Loaded { file, records } => {
                debug!("Merging {} record(s) from {}", records.len(), file);
                records
            }
            LoadOutcome::Failed { .. } => Vec::new(),
        })
        .collect()
}

/// Group records by module name.
///
/// Keys are compared exactly. Within a group, records keep their merge order.
pub fn group_by_module(records: &[TestRecord]) -> BTreeMap<&str, Vec<&TestRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&TestRecord>> = BTreeMap::new();

    for record in records {
        grouped.entry(record.module.as_str()).or_default().push(record);
    }

    grouped
}

/// Compute per-module statistics.
pub fn module_stats(records: &[TestRecord]) -> BTreeMap<String, ModuleStats> {
    group_by_module(records)
        .into_iter()
        .filter_map(|(module, group)| {
            ModuleStats::from_records(group).map(|stats| (module.to_string(), stats))
        })
        .collect()
}

/// Build the run summary from merged records.
pub fn generate_summary(records: Vec<TestRecord>, timestamp: DateTime<Utc>) -> Summary {
    if records.is_empty() {
        return Summary::empty(timestamp);
    }

    let modules = module_stats(&records);

    Summary {
        timestamp,
        total_flaky_tests: records.len(),
        module_count: modules.len(),
        modules,
        tests: records,
    }
}

/// Merge load outcomes and summarize them in one step.
pub fn aggregate(outcomes: Vec<LoadOutcome>, timestamp: DateTime<Utc>) -> (Summary, LoadStats) {
    let stats = LoadStats::from_outcomes(&outcomes);
    let summary = generate_summary(merge_records(outcomes), timestamp);
    (summary, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::loader::LoadError;
    use crate::models::ReportFile;
    use serde_json::Map;

    fn create_test_record(module: &str, name: &str, count: u32) -> TestRecord {
        TestRecord {
            test_name: name.to_string(),
            execution_count: count,
            extra: Map::new(),
            module: module.to_string(),
            report_file: format!("{}/target/junit5-retry-report-1.txt", module),
        }
    }

    fn loaded(module: &str, records: Vec<TestRecord>) -> LoadOutcome {
        LoadOutcome::Loaded {
            file: ReportFile::new(format!("{}/target/junit5-retry-report-1.txt", module)),
            records,
        }
    }

    fn failed(module: &str) -> LoadOutcome {
        let error = serde_json::from_str::<Vec<u32>>("nope").unwrap_err();
        LoadOutcome::Failed {
            file: ReportFile::new(format!("{}/target/junit5-retry-report-1.txt", module)),
            error: LoadError::Parse(error),
        }
    }

    #[test]
    fn test_merge_preserves_order() {
        let outcomes = vec![
            loaded(
                "a",
                vec![create_test_record("a", "t1", 2), create_test_record("a", "t2", 2)],
            ),
            failed("b"),
            loaded("c", vec![create_test_record("c", "t3", 4)]),
        ];

        let merged = merge_records(outcomes);
        let names: Vec<_> = merged.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let outcomes = vec![
            loaded("a", vec![create_test_record("a", "t1", 2)]),
            loaded("a", vec![create_test_record("a", "t1", 3)]),
        ];

        assert_eq!(merge_records(outcomes).len(), 2);
    }

    #[test]
    fn test_group_by_module_is_exact() {
        let records = vec![
            create_test_record("serviceA", "t1", 2),
            create_test_record("ServiceA", "t2", 2),
            create_test_record("serviceA", "t3", 2),
        ];

        let grouped = group_by_module(&records);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get("serviceA").map(|v| v.len()), Some(2));
        assert_eq!(grouped.get("ServiceA").map(|v| v.len()), Some(1));
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), records.len());
    }

    #[test]
    fn test_generate_summary_single_report() {
        let records = vec![create_test_record("serviceA", "testFoo", 3)];
        let summary = generate_summary(records, Utc::now());

        assert_eq!(summary.total_flaky_tests, 1);
        assert_eq!(summary.module_count, 1);

        let stats = &summary.modules["serviceA"];
        assert_eq!(stats.count, 1);
        assert_eq!(stats.avg_execution_count, 3.0);
        assert_eq!(stats.tests, vec!["testFoo"]);
    }

    #[test]
    fn test_generate_summary_statistics() {
        let records = vec![
            create_test_record("orders", "t1", 2),
            create_test_record("users", "u1", 5),
            create_test_record("orders", "t2", 4),
            create_test_record("orders", "t3", 9),
        ];
        let summary = generate_summary(records, Utc::now());

        assert_eq!(summary.total_flaky_tests, 4);
        assert_eq!(summary.module_count, 2);
        assert_eq!(
            summary.modules.keys().collect::<Vec<_>>(),
            vec!["orders", "users"]
        );
        assert_eq!(summary.modules["orders"].avg_execution_count, 5.0);
        assert_eq!(summary.modules["orders"].tests, vec!["t1", "t2", "t3"]);
        assert_eq!(summary.modules["users"].avg_execution_count, 5.0);
        assert_eq!(summary.tests[1].test_name, "u1");
    }

    #[test]
    fn test_generate_summary_empty() {
        let summary = generate_summary(Vec::new(), Utc::now());

        assert_eq!(summary.total_flaky_tests, 0);
        assert_eq!(summary.module_count, 0);
        assert!(summary.modules.is_empty());
        assert!(summary.tests.is_empty());
    }

    #[test]
    fn test_aggregate_skips_failed_reports() {
        let outcomes = vec![
            failed("broken"),
            loaded("serviceA", vec![create_test_record("serviceA", "testFoo", 3)]),
        ];

        let (summary, stats) = aggregate(outcomes, Utc::now());

        assert_eq!(summary.total_flaky_tests, 1);
        assert_eq!(summary.tests[0].test_name, "testFoo");
        assert_eq!(
            stats,
            LoadStats {
                found: 2,
                loaded: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let build = || {
            vec![
                loaded("b", vec![create_test_record("b", "t2", 2)]),
                loaded("a", vec![create_test_record("a", "t1", 3)]),
            ]
        };
        let timestamp = Utc::now();

        let (first, _) = aggregate(build(), timestamp);
        let (second, _) = aggregate(build(), timestamp);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
