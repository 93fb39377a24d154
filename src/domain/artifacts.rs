// ============================================================
// Layer 3 - Artifact Types
// ============================================================
// What each adapter hands back to the application layer.
//
// These are descriptions of files and sessions that live
// outside the process (on disk, or in a local web server).
// The use cases only log them; nothing here owns the data.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::task::TaskType;

/// Files extracted from one dataset download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedDataset {
    /// The `owner/slug` the dataset was fetched as
    pub name: String,
    /// Directory the archive was extracted into
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Something the profiler thinks a human should look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAlert {
    pub column: String,
    pub kind:   AlertKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Constant,
    Unique,
    HighMissing,
    HighCardinality,
    HighCorrelation,
    Empty,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Constant        => "Constant",
            AlertKind::Unique          => "Unique",
            AlertKind::HighMissing     => "Missing",
            AlertKind::HighCardinality => "High cardinality",
            AlertKind::HighCorrelation => "High correlation",
            AlertKind::Empty           => "Empty",
        }
    }
}

/// A profiling report that has already been written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    pub title:   String,
    /// Location of the rendered HTML file
    pub path:    PathBuf,
    pub rows:    usize,
    pub columns: usize,
    pub alerts:  Vec<ProfileAlert>,
}

/// A running interactive editing session.
///
/// The session is owned by the editor; this handle only knows
/// where to find it and how to block until it ends.
pub struct EditSession {
    pub url:     String,
    pub dataset: PathBuf,
    waiter:      Option<Box<dyn FnOnce() -> anyhow::Result<()> + Send>>,
}

impl EditSession {
    pub fn new(url: impl Into<String>, dataset: impl Into<PathBuf>) -> Self {
        Self { url: url.into(), dataset: dataset.into(), waiter: None }
    }

    /// Attach the closure that blocks until the session is closed.
    pub fn with_waiter(
        mut self,
        waiter: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.waiter = Some(Box::new(waiter));
        self
    }

    /// Block until the session ends. Returns immediately for
    /// sessions without a waiter.
    pub fn wait(mut self) -> anyhow::Result<()> {
        match self.waiter.take() {
            Some(waiter) => waiter(),
            None         => Ok(()),
        }
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("url", &self.url)
            .field("dataset", &self.dataset)
            .field("waiting", &self.waiter.is_some())
            .finish()
    }
}

/// One row of the model comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub model: String,
    /// Metric name → cross-validated mean, in display order
    pub metrics: Vec<(String, f64)>,
}

impl LeaderboardEntry {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// The persisted result of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub name:        String,
    pub task:        TaskType,
    /// Directory holding the pipeline, weights and leaderboard
    pub directory:   PathBuf,
    pub best_model:  String,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Scores of the best model on the hold-out split, if any
    pub holdout:     Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    #[test]
    fn test_wait_without_waiter_returns() {
        let session = EditSession::new("http://127.0.0.1:1/", "data/x.csv");
        assert!(session.wait().is_ok());
    }

    #[test]
    fn test_wait_runs_waiter_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let session = EditSession::new("http://127.0.0.1:1/", "data/x.csv")
            .with_waiter(move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });
        session.wait().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_leaderboard_metric_lookup() {
        let entry = LeaderboardEntry {
            model:   "Dummy".into(),
            metrics: vec![("Accuracy".into(), 0.5), ("F1".into(), 0.25)],
        };
        assert_eq!(entry.metric("F1"), Some(0.25));
        assert_eq!(entry.metric("R2"), None);
    }
}
