// ============================================================
// Layer 2 - MlUseCases
// ============================================================
// Holds the four ports as trait objects and forwards each call.
//
//   authenticate_dataset_source → DatasetSource::authenticate
//   download_dataset            → DatasetSource::download
//   profile_data                → DataProfiler::profile
//   edit_data                   → DataEditor::edit
//   train_model                 → ModelTrainer::train

use std::path::Path;

use anyhow::Result;

use crate::domain::{
    artifacts::{DownloadedDataset, EditSession, ProfileReport, TrainedModel},
    traits::{DataEditor, DataProfiler, DatasetSource, ModelTrainer},
};

pub struct MlUseCases {
    dataset_source: Box<dyn DatasetSource>,
    profiler:       Box<dyn DataProfiler>,
    editor:         Box<dyn DataEditor>,
    trainer:        Box<dyn ModelTrainer>,
}

impl MlUseCases {
    pub fn new(
        dataset_source: Box<dyn DatasetSource>,
        profiler:       Box<dyn DataProfiler>,
        editor:         Box<dyn DataEditor>,
        trainer:        Box<dyn ModelTrainer>,
    ) -> Self {
        Self { dataset_source, profiler, editor, trainer }
    }

    pub fn authenticate_dataset_source(&self) -> Result<()> {
        tracing::debug!("Authenticating dataset source");
        self.dataset_source.authenticate()
    }

    pub fn download_dataset(&self, name: &str, destination: &Path) -> Result<DownloadedDataset> {
        tracing::debug!("Downloading '{}' into '{}'", name, destination.display());
        self.dataset_source.download(name, destination)
    }

    pub fn profile_data(&self, csv_filename: &str) -> Result<ProfileReport> {
        tracing::debug!("Profiling '{}'", csv_filename);
        self.profiler.profile(csv_filename)
    }

    pub fn edit_data(&self, csv_filename: &str) -> Result<EditSession> {
        tracing::debug!("Editing '{}'", csv_filename);
        self.editor.edit(csv_filename)
    }

    pub fn train_model(&self, csv_filename: &str, target_col: &str, task_type: &str) -> Result<TrainedModel> {
        tracing::debug!("Training on '{}' (target '{}', task '{}')", csv_filename, target_col, task_type);
        self.trainer.train(csv_filename, target_col, task_type)
    }
}

// ─── Test Doubles ─────────────────────────────────────────────────────────────
// Recording mocks shared with the CLI tests. Every call is
// appended to a shared log; `fail` makes every port error out.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::{cell::RefCell, path::PathBuf, rc::Rc};

    use crate::domain::task::TaskType;

    pub type CallLog = Rc<RefCell<Vec<String>>>;

    pub struct Mock {
        pub log:  CallLog,
        pub fail: bool,
    }

    impl Mock {
        fn record(&self, call: String) -> Result<()> {
            self.log.borrow_mut().push(call.clone());
            if self.fail {
                anyhow::bail!("mock failure: {call}");
            }
            Ok(())
        }
    }

    impl DatasetSource for Mock {
        fn authenticate(&self) -> Result<()> {
            self.record("authenticate".into())
        }

        fn download(&self, name: &str, destination: &Path) -> Result<DownloadedDataset> {
            self.record(format!("download {name} {}", destination.display()))?;
            Ok(DownloadedDataset { name: name.into(), directory: destination.into(), files: Vec::new() })
        }
    }

    impl DataProfiler for Mock {
        fn profile(&self, csv_filename: &str) -> Result<ProfileReport> {
            self.record(format!("profile {csv_filename}"))?;
            Ok(ProfileReport {
                title:   csv_filename.into(),
                path:    PathBuf::from("report.html"),
                rows:    0,
                columns: 0,
                alerts:  Vec::new(),
            })
        }
    }

    impl DataEditor for Mock {
        fn edit(&self, csv_filename: &str) -> Result<EditSession> {
            self.record(format!("edit {csv_filename}"))?;
            Ok(EditSession::new("http://127.0.0.1:0/", csv_filename))
        }
    }

    impl ModelTrainer for Mock {
        fn train(&self, csv_filename: &str, target_col: &str, task_type: &str) -> Result<TrainedModel> {
            self.record(format!("train {csv_filename} {target_col} {task_type}"))?;
            Ok(TrainedModel {
                name:        csv_filename.into(),
                task:        TaskType::Classification,
                directory:   PathBuf::from("models"),
                best_model:  "Dummy Classifier".into(),
                leaderboard: Vec::new(),
                holdout:     Vec::new(),
            })
        }
    }

    /// Orchestrator whose four ports all write to one log.
    pub fn use_cases(fail: bool) -> (MlUseCases, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mock = || Mock { log: log.clone(), fail };
        let use_cases = MlUseCases::new(
            Box::new(mock()),
            Box::new(mock()),
            Box::new(mock()),
            Box::new(mock()),
        );
        (use_cases, log)
    }
}
