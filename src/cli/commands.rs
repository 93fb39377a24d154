// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// The four subcommands and their arguments.
//
// Positional arguments are passed through untouched; filenames
// and task types are validated by the adapter that uses them.
// Optional flags only tune the adapters and all have defaults.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::infra::config::{AutoMlConfig, EditorConfig};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Download a Kaggle dataset into the data directory
    Download(DownloadArgs),

    /// Write an HTML profiling report for a CSV file
    Profile(ProfileArgs),

    /// Open a CSV file in the browser-based editor
    Edit(EditArgs),

    /// Compare models on a CSV file and save the best one
    Train(TrainArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DownloadArgs {
    /// Dataset as `owner/slug` or a Kaggle dataset URL
    pub kaggle_name: String,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ProfileArgs {
    /// CSV file, relative to the data directory
    pub csv_filename: String,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EditArgs {
    /// CSV file, relative to the data directory
    pub csv_filename: String,

    /// Address the editor listens on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port the editor listens on (0 picks a free port)
    #[arg(long, default_value_t = 40000)]
    pub port: u16,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// CSV file, relative to the data directory
    pub csv_filename: String,

    /// Column to predict (ignored for clustering)
    pub target_col: String,

    /// classification, regression or clustering
    pub task_type: String,

    /// Cross-validation folds per candidate model
    #[arg(long, default_value_t = 10)]
    pub folds: usize,

    /// Fraction of rows used for training; the rest is held out
    #[arg(long, default_value_t = 0.7)]
    pub train_size: f64,

    /// Random seed for splits and model initialisation
    #[arg(long, default_value_t = 123)]
    pub session_id: u64,

    /// Training epochs for the neural candidates
    #[arg(long, default_value_t = 60)]
    pub epochs: usize,
}

/// The application layer never sees clap types.
impl From<&EditArgs> for EditorConfig {
    fn from(a: &EditArgs) -> Self {
        EditorConfig { host: a.host.clone(), port: a.port }
    }
}

impl From<&TrainArgs> for AutoMlConfig {
    fn from(a: &TrainArgs) -> Self {
        AutoMlConfig {
            folds:      a.folds,
            train_size: a.train_size,
            session_id: a.session_id,
            epochs:     a.epochs,
            ..AutoMlConfig::default()
        }
    }
}
