// ============================================================
// Adapter - Tabular Profiler
// ============================================================
// Implements DataProfiler with the in-crate profiling engine.
// The report lands at <output_dir>/<stem>_profile_report.html.

use std::path::PathBuf;

use anyhow::Result;

use crate::data::loader::CsvLoader;
use crate::domain::{artifacts::ProfileReport, traits::DataProfiler};
use crate::profiling::generate_report;

pub struct TabularProfilerAdapter {
    loader:     CsvLoader,
    output_dir: PathBuf,
}

impl TabularProfilerAdapter {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { loader: CsvLoader::new(data_dir), output_dir: output_dir.into() }
    }
}

impl DataProfiler for TabularProfilerAdapter {
    fn profile(&self, csv_filename: &str) -> Result<ProfileReport> {
        let (path, table) = self.loader.load(csv_filename)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let title = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());

        let report_path = self.output_dir.join(format!("{stem}_profile_report.html"));
        generate_report(&table, &title, &report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_profile_writes_report_to_output_dir() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(data.path().join("sales.csv"), "region,amount\nnorth,10\nsouth,\nnorth,30\n").unwrap();

        let adapter = TabularProfilerAdapter::new(data.path(), out.path());
        let report = adapter.profile("sales.csv").unwrap();

        assert_eq!(report.path, out.path().join("sales_profile_report.html"));
        assert_eq!(report.title, "sales.csv");
        assert_eq!((report.rows, report.columns), (3, 2));
        assert!(report.path.exists());
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let data = tempfile::tempdir().unwrap();
        let adapter = TabularProfilerAdapter::new(data.path(), data.path());
        let err = adapter.profile("nope.csv").unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
