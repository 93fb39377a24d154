// ============================================================
// Layer 6 - Leaderboard Logger
// ============================================================
// Records the model comparison to a CSV file.
//
// One row per candidate, in rank order; one column per metric.
//
// Example CSV output (classification):
//   model,Accuracy,F1
//   Logistic Regression,0.953333,0.952986
//   K Neighbors Classifier,0.946667,0.946581
//   ...
//
// The same rows are printed to the log as a fixed-width table.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};

use crate::domain::artifacts::LeaderboardEntry;

pub struct LeaderboardLogger {
    csv_path: PathBuf,
}

impl LeaderboardLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { csv_path: dir.join("leaderboard.csv") })
    }

    /// Overwrite the leaderboard with `entries`.
    pub fn write(&self, entries: &[LeaderboardEntry]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;

        let mut header = vec!["model".to_string()];
        if let Some(first) = entries.first() {
            header.extend(first.metrics.iter().map(|(n, _)| n.clone()));
        }
        writer.write_record(&header)?;

        for e in entries {
            let mut record = vec![e.model.clone()];
            record.extend(e.metrics.iter().map(|(_, v)| format!("{v:.6}")));
            writer.write_record(&record)?;
        }
        writer
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.csv_path.display()))?;

        tracing::debug!("Wrote leaderboard to '{}'", self.csv_path.display());
        Ok(())
    }
}

/// Render entries as an aligned text table for the log.
pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let Some(first) = entries.first() else {
        return String::new();
    };
    let name_width = entries.iter().map(|e| e.model.len()).max().unwrap_or(5).max(5);

    let mut out = format!("{:<name_width$}", "Model");
    for (name, _) in &first.metrics {
        out.push_str(&format!("  {name:>10}"));
    }
    for e in entries {
        out.push('\n');
        out.push_str(&format!("{:<name_width$}", e.model));
        for (_, v) in &e.metrics {
            out.push_str(&format!("  {v:>10.4}"));
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<LeaderboardEntry> {
        vec![
            LeaderboardEntry {
                model:   "Linear Regression".into(),
                metrics: vec![("MAE".into(), 0.5), ("R2".into(), 0.9)],
            },
            LeaderboardEntry {
                model:   "Dummy Regressor".into(),
                metrics: vec![("MAE".into(), 2.0), ("R2".into(), 0.0)],
            },
        ]
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = LeaderboardLogger::new(dir.path()).unwrap();
        logger.write(&entries()).unwrap();

        let text = fs::read_to_string(dir.path().join("leaderboard.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "model,MAE,R2");
        assert_eq!(lines[1], "Linear Regression,0.500000,0.900000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_model_names_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let logger = LeaderboardLogger::new(dir.path()).unwrap();
        logger
            .write(&[LeaderboardEntry {
                model:   "K-Means (k=2, seeded)".into(),
                metrics: vec![("Silhouette".into(), 0.75)],
            }])
            .unwrap();

        let table = crate::data::loader::read_table(&dir.path().join("leaderboard.csv")).unwrap();
        assert_eq!(table.headers, vec!["model", "Silhouette"]);
        assert_eq!(table.rows, vec![vec!["K-Means (k=2, seeded)", "0.750000"]]);
    }

    #[test]
    fn test_format_leaderboard_aligns_columns() {
        let text = format_leaderboard(&entries());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Model"));
        assert!(lines[2].starts_with("Dummy Regressor"));
        assert_eq!(format_leaderboard(&[]), "");
    }
}
