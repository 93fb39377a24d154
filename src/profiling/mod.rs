// ============================================================
// Layer 7 - Profiling Engine
// ============================================================
// Exploratory summary of one CSV, written as an HTML report:
//
//   stats.rs  - overview, per-column statistics, correlations,
//               alerts, head/tail sample
//
//   report.rs - handlebars template + inline SVG histograms

pub mod report;
pub mod stats;

use std::path::Path;

use anyhow::Result;

use crate::data::table::Table;
use crate::domain::artifacts::ProfileReport;

/// Profile `table` and write the report to `path`.
pub fn generate_report(table: &Table, title: &str, path: &Path) -> Result<ProfileReport> {
    let profile = stats::profile_table(table);
    tracing::debug!(
        "Profiled {} rows x {} columns, {} alerts",
        profile.overview.rows,
        profile.overview.columns,
        profile.alerts.len()
    );
    report::write_report(&profile, title, &table.headers, path)?;

    Ok(ProfileReport {
        title:   title.to_string(),
        path:    path.to_path_buf(),
        rows:    profile.overview.rows,
        columns: profile.overview.columns,
        alerts:  profile.alerts,
    })
}
