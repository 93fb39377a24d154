// ============================================================
// Layer 3 - Task Type
// ============================================================
// The kind of learning problem the `train` command runs.
//
// The CLI passes the task type through as free text; parsing
// happens here, at the point where the training engine needs
// it, so an unknown value is rejected by the tool that would
// have to act on it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Classification,
    Regression,
    Clustering,
}

impl TaskType {
    /// Supervised tasks need a target column; clustering does not.
    pub fn is_supervised(&self) -> bool {
        !matches!(self, TaskType::Clustering)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Classification => "classification",
            TaskType::Regression     => "regression",
            TaskType::Clustering     => "clustering",
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classification" => Ok(TaskType::Classification),
            "regression"     => Ok(TaskType::Regression),
            "clustering"     => Ok(TaskType::Clustering),
            other => anyhow::bail!(
                "Unsupported task type '{other}': expected classification, regression, or clustering"
            ),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
