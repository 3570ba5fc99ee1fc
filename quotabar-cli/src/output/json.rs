//! JSON output formatting.

use anyhow::Result;
use quotabar_core::UsageReport;

/// Formats the report as pretty-printed JSON keyed by provider.
pub fn format_json(report: &UsageReport) -> Result<String> {
    Ok(report.to_json_pretty()?)
}
