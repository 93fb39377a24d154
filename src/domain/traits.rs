// ============================================================
// Layer 3 - Ports (Core Traits)
// ============================================================
// One trait per external tool the pipeline drives.
//
// The application layer only ever sees these traits, boxed.
// Concrete adapters live in `crate::adapters`:
//   - KaggleDownloaderAdapter → DatasetSource
//   - TabularProfilerAdapter  → DataProfiler
//   - GridEditorAdapter       → DataEditor
//   - AutoMlAdapter           → ModelTrainer
//
// Tests swap in recording mocks through the same traits.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use std::path::Path;

use anyhow::Result;

use crate::domain::artifacts::{DownloadedDataset, EditSession, ProfileReport, TrainedModel};

/// A remote dataset host.
pub trait DatasetSource {
    /// Load and remember credentials. Must succeed before `download`.
    fn authenticate(&self) -> Result<()>;

    /// Fetch the dataset `name` and unpack it into `destination`.
    fn download(&self, name: &str, destination: &Path) -> Result<DownloadedDataset>;
}

/// Automated exploratory data analysis.
pub trait DataProfiler {
    /// Profile one CSV file and persist the report.
    fn profile(&self, csv_filename: &str) -> Result<ProfileReport>;
}

/// An interactive, browser-based data editor.
pub trait DataEditor {
    /// Launch an editing session for one CSV file.
    fn edit(&self, csv_filename: &str) -> Result<EditSession>;
}

/// Automated model training and selection.
pub trait ModelTrainer {
    /// `task_type` is passed through as given; implementations
    /// decide which values they accept.
    fn train(&self, csv_filename: &str, target_col: &str, task_type: &str) -> Result<TrainedModel>;
}
