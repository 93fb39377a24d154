// ============================================================
// Adapter - AutoML Trainer
// ============================================================
// Implements ModelTrainer with the in-crate AutoML engine.
// The task type arrives as free text and is parsed here; the
// model directory is <models_dir>/<stem>_<task>/.

use std::path::PathBuf;

use anyhow::Result;

use crate::data::loader::CsvLoader;
use crate::domain::{artifacts::TrainedModel, task::TaskType, traits::ModelTrainer};
use crate::infra::config::AutoMlConfig;
use crate::ml::automl::AutoMl;

pub struct AutoMlAdapter {
    loader: CsvLoader,
    engine: AutoMl,
}

impl AutoMlAdapter {
    pub fn new(data_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>, config: AutoMlConfig) -> Self {
        Self { loader: CsvLoader::new(data_dir), engine: AutoMl::new(config, models_dir) }
    }
}

impl ModelTrainer for AutoMlAdapter {
    fn train(&self, csv_filename: &str, target_col: &str, task_type: &str) -> Result<TrainedModel> {
        let task: TaskType = task_type.parse()?;
        let (path, table) = self.loader.load(csv_filename)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());

        tracing::debug!("Loaded {} rows x {} columns from '{}'", table.n_rows(), table.n_cols(), path.display());
        self.engine.run(&table, &stem, target_col, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &std::path::Path) {
        let mut text = String::from("x,y\n");
        for i in 0..20 {
            text.push_str(&format!("{},{}\n", i, 3 * i + 2));
        }
        fs::write(dir.join("line.csv"), text).unwrap();
    }

    fn quick() -> AutoMlConfig {
        AutoMlConfig { folds: 3, epochs: 20, ..AutoMlConfig::default() }
    }

    #[test]
    fn test_unknown_task_type_is_rejected() {
        let data = tempfile::tempdir().unwrap();
        write_csv(data.path());
        let adapter = AutoMlAdapter::new(data.path(), data.path().join("models"), quick());
        let err = adapter.train("line.csv", "y", "forecasting").unwrap_err();
        assert!(err.to_string().contains("forecasting"));
        assert!(!data.path().join("models").exists());
    }

    #[test]
    fn test_train_uses_file_stem_and_task() {
        let data = tempfile::tempdir().unwrap();
        write_csv(data.path());
        let models = data.path().join("models");
        let adapter = AutoMlAdapter::new(data.path(), &models, quick());

        let trained = adapter.train("line.csv", "y", "Regression").unwrap();
        assert_eq!(trained.name, "line");
        assert_eq!(trained.task, TaskType::Regression);
        assert_eq!(trained.directory, models.join("line_regression"));
        assert!(trained.directory.join("leaderboard.csv").exists());
    }
}
