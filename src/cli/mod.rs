// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// All work is delegated to Layer 2 (MlUseCases).
//
// Four commands are supported:
//   1. `download <kaggle_name>`
//   2. `profile <csv_filename>`
//   3. `edit <csv_filename>`
//   4. `train <csv_filename> <target_col> <task_type>`
//
// With no command the help text is printed and nothing runs.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use commands::{Commands, DownloadArgs, EditArgs, ProfileArgs, TrainArgs};

use crate::adapters::{AutoMlAdapter, GridEditorAdapter, KaggleDownloaderAdapter, TabularProfilerAdapter};
use crate::application::ml_use_cases::MlUseCases;
use crate::infra::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "ml-pipeline",
    version,
    about = "Download, profile, edit and AutoML-train tabular datasets."
)]
pub struct Cli {
    /// Directory CSV filenames are resolved against and downloads land in
    #[arg(long, global = true, env = "ML_PIPELINE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for profiling reports and trained models
    #[arg(long, global = true, env = "ML_PIPELINE_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Build the real adapters and dispatch.
    pub fn run(self) -> Result<()> {
        let config = self.config();
        let use_cases = build_use_cases(&config);
        self.dispatch(&use_cases, &config)
    }

    /// Settings for every adapter; subcommand flags override defaults.
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig {
            data_dir:   self.data_dir.clone(),
            output_dir: self.output_dir.clone(),
            ..PipelineConfig::default()
        };
        match &self.command {
            Some(Commands::Edit(args))  => config.editor = args.into(),
            Some(Commands::Train(args)) => config.automl = args.into(),
            _ => {}
        }
        config
    }

    /// Route the parsed command to its use case.
    pub fn dispatch(&self, use_cases: &MlUseCases, config: &PipelineConfig) -> Result<()> {
        match &self.command {
            Some(Commands::Download(args)) => run_download(use_cases, args, config),
            Some(Commands::Profile(args))  => run_profile(use_cases, args),
            Some(Commands::Edit(args))     => run_edit(use_cases, args),
            Some(Commands::Train(args))    => run_train(use_cases, args),
            None => {
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}

/// Wire the four production adapters into the orchestrator.
pub fn build_use_cases(config: &PipelineConfig) -> MlUseCases {
    MlUseCases::new(
        Box::new(KaggleDownloaderAdapter::new(config.kaggle.clone())),
        Box::new(TabularProfilerAdapter::new(&config.data_dir, &config.output_dir)),
        Box::new(GridEditorAdapter::new(&config.data_dir, config.editor.clone())),
        Box::new(AutoMlAdapter::new(&config.data_dir, config.models_dir(), config.automl.clone())),
    )
}

fn run_download(use_cases: &MlUseCases, args: &DownloadArgs, config: &PipelineConfig) -> Result<()> {
    tracing::info!("Authenticating with Kaggle...");
    use_cases.authenticate_dataset_source()?;

    tracing::info!("Authentication successful. Now downloading dataset...");
    let dataset = use_cases.download_dataset(&args.kaggle_name, &config.data_dir)?;
    tracing::debug!("'{}' unpacked into '{}':", dataset.name, dataset.directory.display());
    for file in &dataset.files {
        tracing::debug!("  {}", file.display());
    }

    tracing::info!("Download step finished.");
    Ok(())
}

fn run_profile(use_cases: &MlUseCases, args: &ProfileArgs) -> Result<()> {
    tracing::info!("Generating profiling report for {}...", args.csv_filename);
    let report = use_cases.profile_data(&args.csv_filename)?;
    tracing::debug!(
        "'{}' ({} rows x {} columns) written to '{}' with {} alerts",
        report.title,
        report.rows,
        report.columns,
        report.path.display(),
        report.alerts.len()
    );

    tracing::info!("Profile report generated. Check the output folder for an HTML file.");
    Ok(())
}

fn run_edit(use_cases: &MlUseCases, args: &EditArgs) -> Result<()> {
    tracing::info!("Launching editor for {}...", args.csv_filename);
    let session = use_cases.edit_data(&args.csv_filename)?;

    tracing::info!("Editor session opened at {}", session.url);
    tracing::debug!("Editing '{}'", session.dataset.display());
    session.wait()
}

fn run_train(use_cases: &MlUseCases, args: &TrainArgs) -> Result<()> {
    tracing::info!(
        "Training a model on {} | Target: {} | Task: {}",
        args.csv_filename,
        args.target_col,
        args.task_type
    );
    let model = use_cases.train_model(&args.csv_filename, &args.target_col, &args.task_type)?;
    tracing::debug!(
        "{} {} run compared {} models",
        model.name,
        model.task,
        model.leaderboard.len()
    );
    for (metric, value) in &model.holdout {
        tracing::debug!("  hold-out {metric}: {value:.4}");
    }
    tracing::info!("Best model: {} (saved to '{}')", model.best_model, model.directory.display());

    tracing::info!("Training complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml_use_cases::mocks::use_cases;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ml-pipeline").chain(args.iter().copied())).unwrap()
    }

    fn run_with_mocks(args: &[&str]) -> (Result<()>, Vec<String>) {
        let cli = parse(args);
        let (uc, log) = use_cases(false);
        let result = cli.dispatch(&uc, &cli.config());
        let calls = log.borrow().clone();
        (result, calls)
    }

    #[test]
    fn test_download_authenticates_then_downloads() {
        let (result, calls) = run_with_mocks(&["--data-dir", "raw", "download", "uciml/iris"]);
        result.unwrap();
        assert_eq!(calls, vec!["authenticate", "download uciml/iris raw"]);
    }

    #[test]
    fn test_profile_edit_train_pass_arguments_through() {
        let (r, calls) = run_with_mocks(&["profile", "Titanic.csv"]);
        r.unwrap();
        assert_eq!(calls, vec!["profile Titanic.csv"]);

        let (r, calls) = run_with_mocks(&["edit", "Titanic.csv"]);
        r.unwrap();
        assert_eq!(calls, vec!["edit Titanic.csv"]);

        // task type is not validated here
        let (r, calls) = run_with_mocks(&["train", "Titanic.csv", "Survived", "CLASSIFICATION?"]);
        r.unwrap();
        assert_eq!(calls, vec!["train Titanic.csv Survived CLASSIFICATION?"]);
    }

    #[test]
    fn test_no_command_makes_no_calls() {
        let (result, calls) = run_with_mocks(&[]);
        result.unwrap();
        assert!(calls.is_empty());
    }

    #[test]
    fn test_adapter_error_reaches_caller() {
        let cli = parse(&["profile", "x.csv"]);
        let (uc, _log) = use_cases(true);
        let err = cli.dispatch(&uc, &cli.config()).unwrap_err();
        assert_eq!(err.to_string(), "mock failure: profile x.csv");
    }

    #[test]
    fn test_failed_authentication_skips_download() {
        let cli = parse(&["download", "a/b"]);
        let (uc, log) = use_cases(true);
        assert!(cli.dispatch(&uc, &cli.config()).is_err());
        assert_eq!(*log.borrow(), vec!["authenticate"]);
    }

    #[test]
    fn test_flags_become_config() {
        let cli = parse(&[
            "--output-dir", "out", "train", "d.csv", "y", "regression",
            "--folds", "5", "--train-size", "0.8", "--session-id", "7", "--epochs", "3",
        ]);
        let config = cli.config();
        assert_eq!(config.models_dir(), PathBuf::from("out/models"));
        assert_eq!(config.automl.folds, 5);
        assert_eq!(config.automl.train_size, 0.8);
        assert_eq!(config.automl.session_id, 7);
        assert_eq!(config.automl.epochs, 3);

        let cli = parse(&["edit", "d.csv", "--port", "0", "--host", "0.0.0.0"]);
        assert_eq!(cli.config().editor.port, 0);
        assert_eq!(cli.config().editor.host, "0.0.0.0");
    }

    #[test]
    fn test_train_requires_three_positionals() {
        assert!(Cli::try_parse_from(["ml-pipeline", "train", "d.csv", "y"]).is_err());
    }
}
