// ============================================================
// Layer 6 - Model Store
// ============================================================
// Persists everything needed to use a trained model later.
//
// Layout of one model directory:
//   models/<stem>_<task>/
//     train_config.json   ← the AutoML settings of the run
//     pipeline.json       ← feature pipeline, labels, model state
//     model.mpk.gz        ← burn weights (neural models only)
//     leaderboard.csv     ← the model comparison
//     assignments.csv     ← input rows + cluster (clustering only)
//
// Burn's CompactRecorder (called by the neural estimator)
// writes the weights as gzipped MessagePack at half precision.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::write_table,
    preprocessor::{FeaturePipeline, LabelEncoder},
    table::Table,
};
use crate::domain::task::TaskType;
use crate::infra::config::AutoMlConfig;
use crate::ml::estimators::{restore, Estimator, ModelState};

/// Everything in pipeline.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPipeline {
    pub task:       TaskType,
    pub model_name: String,
    /// `None` for clustering
    pub target:     Option<String>,
    pub features:   FeaturePipeline,
    /// Class labels for classification
    pub labels:     Option<LabelEncoder>,
    pub model:      ModelState,
}

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Open (and create if needed) a model directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_config(&self, cfg: &AutoMlConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn save_pipeline(&self, pipeline: &StoredPipeline) -> Result<()> {
        let path = self.dir.join("pipeline.json");
        fs::write(&path, serde_json::to_string_pretty(pipeline)?)
            .with_context(|| format!("Cannot write pipeline to '{}'", path.display()))?;
        tracing::debug!("Saved pipeline to '{}'", path.display());
        Ok(())
    }

    pub fn load_pipeline(&self) -> Result<StoredPipeline> {
        let path = self.dir.join("pipeline.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Has this model been trained?", path.display())
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rebuild the stored supervised estimator.
    pub fn load_estimator(&self) -> Result<(StoredPipeline, Box<dyn Estimator>)> {
        let pipeline = self.load_pipeline()?;
        let estimator = restore(&pipeline.model, &self.dir)?;
        Ok((pipeline, estimator))
    }

    /// Write the input rows with an extra `Cluster` column.
    pub fn save_assignments(&self, table: &Table, labels: &[usize]) -> Result<PathBuf> {
        let mut headers = table.headers.clone();
        headers.push("Cluster".to_string());
        let rows = table
            .rows
            .iter()
            .zip(labels)
            .map(|(row, label)| {
                let mut row = row.clone();
                row.push(format!("Cluster {label}"));
                row
            })
            .collect();

        let path = self.dir.join("assignments.csv");
        write_table(&path, &Table::new(headers, rows))?;
        Ok(path)
    }
}
