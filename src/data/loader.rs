// ============================================================
// Layer 4 - CSV Loader
// ============================================================
// Reads and writes CSV files under the data directory using
// the `csv` crate.
//
// Filenames given on the command line are resolved against
// the data directory (`data/` by default). Absolute paths are
// used as-is. A relative path is only taken from the working
// directory when nothing of that name exists under the data
// directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::table::Table;

pub struct CsvLoader {
    /// Directory that bare filenames are resolved against
    data_dir: PathBuf,
}

impl CsvLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// Resolve a CSV filename to the path it will be read from.
    pub fn resolve(&self, csv_filename: &str) -> PathBuf {
        let given = Path::new(csv_filename);
        if given.is_absolute() {
            return given.to_path_buf();
        }
        let candidate = self.data_dir.join(given);
        if !candidate.exists() && given.exists() {
            given.to_path_buf()
        } else {
            candidate
        }
    }

    /// Resolve and read one CSV file.
    pub fn load(&self, csv_filename: &str) -> Result<(PathBuf, Table)> {
        let path = self.resolve(csv_filename);
        let table = read_table(&path)?;
        Ok((path, table))
    }
}

/// Read a CSV file with a header row. Ragged rows are padded
/// or truncated to the header width.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open CSV file '{}'", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Cannot read header row of '{}'", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Malformed CSV record {} in '{}'", line + 1, path.display())
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(
        "Read {} rows x {} columns from '{}'",
        rows.len(),
        headers.len(),
        path.display()
    );
    Ok(Table::new(headers, rows))
}

/// Write a table back to disk, header first.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create CSV file '{}'", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Cannot flush CSV file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolves_bare_names_under_data_dir() {
        let loader = CsvLoader::new("some/data/dir");
        assert_eq!(
            loader.resolve("does-not-exist.csv"),
            PathBuf::from("some/data/dir/does-not-exist.csv")
        );
    }

    #[test]
    fn test_data_dir_wins_over_working_directory() {
        // tests run from the package root, where Cargo.toml exists too
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "a\n1\n").unwrap();

        let loader = CsvLoader::new(dir.path());
        assert_eq!(loader.resolve("Cargo.toml"), dir.path().join("Cargo.toml"));

        let absolute = dir.path().join("Cargo.toml");
        let elsewhere = CsvLoader::new("unused");
        assert_eq!(elsewhere.resolve(absolute.to_str().unwrap()), absolute);
        // falls back to the working directory only when the data dir lacks the file
        assert_eq!(elsewhere.resolve("Cargo.toml"), PathBuf::from("Cargo.toml"));
    }

    #[test]
    fn test_reads_ragged_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ragged.csv"), "a, b ,c\n1,2\n3,4,5,6\n").unwrap();

        let loader = CsvLoader::new(dir.path());
        let (path, table) = loader.load("ragged.csv").unwrap();
        assert_eq!(path, dir.path().join("ragged.csv"));
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows, vec![vec!["1", "2", ""], vec!["3", "4", "5"]]);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvLoader::new(dir.path()).load("nope.csv").unwrap_err();
        assert!(format!("{err:#}").contains("nope.csv"));
    }

    #[test]
    fn test_write_then_read_keeps_quoted_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::new(
            vec!["name".into(), "note".into()],
            vec![vec!["x".into(), "has, comma".into()]],
        );
        write_table(&path, &table).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);
    }
}
