// ============================================================
// Layer 6 - Pipeline Configuration
// ============================================================
// Plain, serialisable settings for every adapter.
//
// The CLI layer converts clap arguments into these structs,
// so nothing below Layer 1 depends on clap. The AutoML part
// is written next to each trained model as train_config.json.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ml::trainer::NetSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where CSV filenames are resolved and downloads land
    pub data_dir:   PathBuf,
    /// Where reports and model directories are written
    pub output_dir: PathBuf,
    pub kaggle:     KaggleConfig,
    pub editor:     EditorConfig,
    pub automl:     AutoMlConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir:   PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            kaggle:     KaggleConfig::default(),
            editor:     EditorConfig::default(),
            automl:     AutoMlConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Directory that holds one sub-directory per trained model.
    pub fn models_dir(&self) -> PathBuf {
        self.output_dir.join("models")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaggleConfig {
    /// Base URL of the Kaggle REST API
    pub api_base: String,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self { api_base: "https://www.kaggle.com/api/v1".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    pub host: String,
    /// 0 lets the OS pick a free port
    pub port: u16,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 40000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoMlConfig {
    /// Cross-validation folds per candidate
    pub folds:         usize,
    /// Fraction of rows used for training; the rest is hold-out
    pub train_size:    f64,
    /// Seed for splits, folds and weight initialisation
    pub session_id:    u64,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    /// Largest k tried when clustering
    pub max_clusters:  usize,
}

impl Default for AutoMlConfig {
    fn default() -> Self {
        Self {
            folds:         10,
            train_size:    0.7,
            session_id:    123,
            epochs:        60,
            batch_size:    32,
            learning_rate: 1e-2,
            max_clusters:  8,
        }
    }
}

impl AutoMlConfig {
    pub fn net_settings(&self) -> NetSettings {
        NetSettings {
            epochs:        self.epochs,
            batch_size:    self.batch_size,
            learning_rate: self.learning_rate,
            seed:          self.session_id,
        }
    }
}
