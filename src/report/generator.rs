//! Summary rendering and persistence.
//!
//! Produces the console summary, the JSON summary file and the optional
//! Markdown report from an aggregated [`Summary`].

use crate::analysis::LoadStats;
use crate::models::{ReportFile, Summary};
use anyhow::{Context, Result};
use std::path::Path;

const BANNER_WIDTH: usize = 60;

/// Render the list of discovered report files.
pub fn generate_discovery_section(reports: &[ReportFile]) -> String {
    let mut section = String::new();

    if reports.is_empty() {
        section.push_str("✅ No flaky test reports found - no flaky tests detected!\n");
        return section;
    }

    section.push_str(&format!("Found {} report file(s):\n", reports.len()));
    for report in reports {
        section.push_str(&format!("  - {}\n", report));
    }

    section
}

/// Render the console summary.
pub fn generate_console_report(summary: &Summary, stats: &LoadStats) -> String {
    let mut output = String::new();
    let banner = "=".repeat(BANNER_WIDTH);

    output.push_str(&format!("\n{}\n", banner));
    output.push_str("FLAKY TEST SUMMARY\n");
    output.push_str(&format!("{}\n", banner));
    output.push_str(&format!("Total flaky tests: {}\n", summary.total_flaky_tests));

    if stats.failed > 0 {
        output.push_str(&format!(
            "⚠️  {} of {} report file(s) could not be loaded\n",
            stats.failed, stats.found
        ));
    }

    if summary.is_empty() {
        return output;
    }

    output.push_str("\nBy module:\n");
    for (module, module_stats) in &summary.modules {
        output.push_str(&format!(
            "  {}: {} flaky test(s)\n",
            module, module_stats.count
        ));
        for test in summary.records_for_module(module) {
            output.push_str(&format!(
                "    - {} (ran {} times)\n",
                test.test_name, test.execution_count
            ));
        }
    }

    output
}

/// Generate the JSON summary.
pub fn generate_json_summary(summary: &Summary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Write the JSON summary, replacing any existing file.
pub fn write_json_summary(summary: &Summary, path: &Path) -> Result<()> {
    let content = generate_json_summary(summary)?;
    write_output(path, &content)
}

/// Generate a Markdown report.
pub fn generate_markdown_report(summary: &Summary) -> String {
    let mut output = String::new();

    output.push_str("# Flaky Test Summary\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "- **Total Flaky Tests:** {}\n",
        summary.total_flaky_tests
    ));
    output.push_str(&format!("- **Modules:** {}\n\n", summary.module_count));

    if summary.is_empty() {
        output.push_str("No flaky tests were detected. 🎉\n");
        return output;
    }

    output.push_str("## Modules\n\n");
    output.push_str("| Module | Flaky Tests | Avg. Executions |\n");
    output.push_str("|:---|:---:|:---:|\n");
    for (module, stats) in &summary.modules {
        output.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            module, stats.count, stats.avg_execution_count
        ));
    }
    output.push('\n');

    output.push_str("## Tests\n\n");
    for module in summary.modules.keys() {
        output.push_str(&format!("### {}\n\n", module));
        for test in summary.records_for_module(module) {
            output.push_str(&format!(
                "- `{}` ran {} times\n",
                test.test_name, test.execution_count
            ));
        }
        output.push('\n');
    }

    output
}

/// Write the Markdown report, replacing any existing file.
pub fn write_markdown_report(summary: &Summary, path: &Path) -> Result<()> {
    write_output(path, &generate_markdown_report(summary))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::generate_summary;
    use crate::models::TestRecord;
    use chrono::Utc;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn create_test_summary() -> Summary {
        let record = |module: &str, name: &str, count: u32| TestRecord {
            test_name: name.to_string(),
            execution_count: count,
            extra: Map::new(),
            module: module.to_string(),
            report_file: format!("{}/target/junit5-retry-report-1.txt", module),
        };

        generate_summary(
            vec![
                record("user-service", "UserServiceTest#testCreate", 2),
                record("order-service", "OrderTest#testTotal", 3),
                record("user-service", "UserServiceTest#testEmail[1] flaky@example.com", 4),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_discovery_section_empty() {
        let section = generate_discovery_section(&[]);
        assert!(section.contains("No flaky test reports found"));
    }

    #[test]
    fn test_discovery_section_lists_files() {
        let reports = vec![ReportFile::new("a/target/junit5-retry-report-1.txt")];
        let section = generate_discovery_section(&reports);
        assert!(section.contains("Found 1 report file(s):"));
        assert!(section.contains("  - a/target/junit5-retry-report-1.txt"));
    }

    #[test]
    fn test_console_report() {
        let summary = create_test_summary();
        let report = generate_console_report(&summary, &LoadStats::default());

        assert!(report.contains("FLAKY TEST SUMMARY"));
        assert!(report.contains("Total flaky tests: 3"));
        assert!(report.contains("  order-service: 1 flaky test(s)"));
        assert!(report.contains("  user-service: 2 flaky test(s)"));
        assert!(report.contains("    - OrderTest#testTotal (ran 3 times)"));
        assert!(!report.contains("could not be loaded"));

        let order = report.find("order-service").unwrap();
        let user = report.find("user-service").unwrap();
        assert!(order < user);
    }

    #[test]
    fn test_console_report_mentions_failures() {
        let summary = Summary::empty(Utc::now());
        let stats = LoadStats {
            found: 2,
            loaded: 0,
            failed: 2,
        };
        let report = generate_console_report(&summary, &stats);

        assert!(report.contains("Total flaky tests: 0"));
        assert!(report.contains("2 of 2 report file(s) could not be loaded"));
        assert!(!report.contains("By module:"));
    }

    #[test]
    fn test_json_summary_shape() {
        let summary = create_test_summary();
        let json_str = generate_json_summary(&summary).unwrap();
        let value: Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(value["totalFlakyTests"], json!(3));
        assert_eq!(value["moduleCount"], json!(2));
        assert_eq!(value["modules"]["user-service"]["count"], json!(2));
        assert_eq!(value["modules"]["user-service"]["avgExecutionCount"], json!(3.0));
        assert_eq!(value["tests"][1]["module"], json!("order-service"));
        assert!(json_str.contains("\n  \"timestamp\""));
    }

    #[test]
    fn test_write_json_summary_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flaky-tests-summary.json");
        std::fs::write(&path, "stale content that is much longer than an empty summary").unwrap();

        let summary = Summary::empty(Utc::now());
        write_json_summary(&summary, &path).unwrap();

        let written: Summary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, summary);
    }

    #[test]
    fn test_write_json_summary_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build/reports/summary.json");

        write_json_summary(&Summary::empty(Utc::now()), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_json_summary_failure() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the output file cannot be written.
        let err = write_json_summary(&Summary::empty(Utc::now()), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to write report"));
    }

    #[test]
    fn test_markdown_report() {
        let summary = create_test_summary();
        let markdown = generate_markdown_report(&summary);

        assert!(markdown.contains("# Flaky Test Summary"));
        assert!(markdown.contains("| user-service | 2 | 3.00 |"));
        assert!(markdown.contains("### order-service"));
        assert!(markdown.contains("- `OrderTest#testTotal` ran 3 times"));
    }

    #[test]
    fn test_markdown_report_empty() {
        let markdown = generate_markdown_report(&Summary::empty(Utc::now()));
        assert!(markdown.contains("No flaky tests were detected"));
        assert!(!markdown.contains("## Modules"));
    }
}
