// ============================================================
// Layer 5 - AutoML Engine
// ============================================================
// Compares candidate models on one table and keeps the best.
//
// Supervised tasks (classification, regression):
//
//   Step 1: Encode the target, dropping rows where it is missing
//   Step 2: Shuffle-split into training and hold-out rows
//   Step 3: Fit the feature pipeline on the training rows
//   Step 4: K-fold cross-validate every candidate
//   Step 5: Rank the leaderboard (Accuracy / R2, descending)
//   Step 6: Refit the winner on the training rows, score hold-out
//   Step 7: Refit pipeline + winner on all rows and persist
//
// Clustering:
//
//   Step 1: Fit the feature pipeline on all rows
//   Step 2: K-Means for k = 2..=max_clusters
//   Step 3: Keep the k with the best silhouette, persist the
//           centroids and the per-row cluster assignments

use std::path::PathBuf;

use anyhow::Result;
use ndarray::Array2;

use crate::data::{
    dataset::{take, take_rows},
    preprocessor::{FeaturePipeline, LabelEncoder},
    splitter::{k_fold, split_train_holdout},
    table::{is_missing, parse_number, Table},
};
use crate::domain::{
    artifacts::{LeaderboardEntry, TrainedModel},
    task::TaskType,
};
use crate::infra::{
    config::AutoMlConfig,
    metrics::{format_leaderboard, LeaderboardLogger},
    model_store::{ModelStore, StoredPipeline},
};
use crate::ml::{
    estimators::{Candidate, ModelState},
    kmeans::KMeans,
    metrics,
};

/// Fewest usable rows a supervised run accepts.
const MIN_SUPERVISED_ROWS: usize = 4;

pub struct AutoMl {
    config:     AutoMlConfig,
    models_dir: PathBuf,
}

impl AutoMl {
    pub fn new(config: AutoMlConfig, models_dir: impl Into<PathBuf>) -> Self {
        Self { config, models_dir: models_dir.into() }
    }

    /// Train on `table` and persist the chosen model under
    /// `<models_dir>/<name>_<task>/`.
    pub fn run(&self, table: &Table, name: &str, target_col: &str, task: TaskType) -> Result<TrainedModel> {
        if task.is_supervised() {
            self.run_supervised(table, name, target_col, task)
        } else {
            self.run_clustering(table, name, target_col)
        }
    }

    fn run_supervised(&self, table: &Table, name: &str, target_col: &str, task: TaskType) -> Result<TrainedModel> {
        let cfg = &self.config;

        // ── Step 1: Target ────────────────────────────────────────────────────
        let target_idx = table.column_index(target_col).ok_or_else(|| {
            anyhow::anyhow!(
                "Target column '{}' not found. Available columns: {}",
                target_col,
                table.headers.join(", ")
            )
        })?;
        let (data, y, labels) = prepare_target(table, target_idx, task)?;
        let n_classes = labels.as_ref().map_or(0, LabelEncoder::len);
        let n = data.n_rows();
        if n < MIN_SUPERVISED_ROWS {
            anyhow::bail!("Need at least {MIN_SUPERVISED_ROWS} rows with a target value, found {n}");
        }

        // ── Step 2-3: Split and fit features on training rows ─────────────────
        let (train_rows, holdout_rows) = split_train_holdout(n, cfg.train_size, cfg.session_id);
        if train_rows.len() < 2 {
            anyhow::bail!("train_size {} leaves fewer than 2 training rows", cfg.train_size);
        }
        let pipeline = FeaturePipeline::fit(&data, &train_rows, Some(target_idx))?;
        let x_train = pipeline.transform(&data, &train_rows);
        let y_train = take(&y, &train_rows);
        tracing::info!(
            "Split: {} train, {} hold-out | {} features",
            train_rows.len(),
            holdout_rows.len(),
            pipeline.width()
        );
        tracing::debug!("Features: {}", pipeline.feature_names().join(", "));

        // ── Step 4-5: Cross-validated comparison ──────────────────────────────
        let board = compare_models(task, &Candidate::for_task(task), &x_train, &y_train, n_classes, cfg)?;
        let entries: Vec<LeaderboardEntry> = board.iter().map(|(_, e)| e.clone()).collect();
        tracing::info!("Model comparison:\n{}", format_leaderboard(&entries));

        let best = board
            .first()
            .map(|(c, _)| *c)
            .ok_or_else(|| anyhow::anyhow!("No candidate models for task '{task}'"))?;
        tracing::info!("Best model: {}", best.display_name());

        // ── Step 6: Hold-out score ────────────────────────────────────────────
        let net = cfg.net_settings();
        let holdout = if holdout_rows.is_empty() {
            Vec::new()
        } else {
            let mut model = best.build(n_classes, &net);
            model.fit(&x_train, &y_train)?;
            let x_hold = pipeline.transform(&data, &holdout_rows);
            let y_hold = take(&y, &holdout_rows);
            let scores = score(task, &y_hold, &model.predict(&x_hold)?, n_classes);
            tracing::info!("Hold-out: {}", describe(&scores));
            scores
        };

        // ── Step 7: Finalise on all rows and persist ──────────────────────────
        let all_rows: Vec<usize> = (0..n).collect();
        let final_pipeline = FeaturePipeline::fit(&data, &all_rows, Some(target_idx))?;
        let x_all = final_pipeline.transform(&data, &all_rows);
        let mut final_model = best.build(n_classes, &net);
        final_model.fit(&x_all, &y)?;

        let store = ModelStore::new(self.models_dir.join(format!("{name}_{task}")))?;
        store.save_config(cfg)?;
        let state = final_model.save(store.dir())?;
        store.save_pipeline(&StoredPipeline {
            task,
            model_name: best.display_name().to_string(),
            target:     Some(target_col.to_string()),
            features:   final_pipeline,
            labels,
            model:      state,
        })?;
        LeaderboardLogger::new(store.dir())?.write(&entries)?;
        check_reload(&store, &data)?;
        tracing::info!("Model saved to '{}'", store.dir().display());

        Ok(TrainedModel {
            name:        name.to_string(),
            task,
            directory:   store.dir().to_path_buf(),
            best_model:  best.display_name().to_string(),
            leaderboard: entries,
            holdout,
        })
    }

    fn run_clustering(&self, table: &Table, name: &str, target_col: &str) -> Result<TrainedModel> {
        let cfg = &self.config;
        if !target_col.is_empty() {
            tracing::info!("Clustering has no target; '{}' is treated as an ordinary column", target_col);
        }

        let n = table.n_rows();
        if n < 3 {
            anyhow::bail!("Need at least 3 rows to cluster, found {n}");
        }
        let all_rows: Vec<usize> = (0..n).collect();
        let pipeline = FeaturePipeline::fit(table, &all_rows, None)?;
        let x = pipeline.transform(table, &all_rows);

        let max_k = cfg.max_clusters.max(2).min(n - 1);
        let mut runs: Vec<(KMeans, LeaderboardEntry)> = Vec::new();
        for k in 2..=max_k {
            let km = KMeans::fit(&x, k, cfg.session_id)?;
            let silhouette = metrics::silhouette(&x, &km.labels, cfg.session_id);
            tracing::debug!("k={} silhouette={:.4} inertia={:.4}", km.k, silhouette, km.inertia);
            let entry = LeaderboardEntry {
                model:   format!("K-Means (k={k})"),
                metrics: vec![("Silhouette".into(), silhouette), ("Inertia".into(), km.inertia)],
            };
            runs.push((km, entry));
        }
        runs.sort_by(|a, b| rank_value(&b.1, "Silhouette").total_cmp(&rank_value(&a.1, "Silhouette")));

        let entries: Vec<LeaderboardEntry> = runs.iter().map(|(_, e)| e.clone()).collect();
        tracing::info!("Model comparison:\n{}", format_leaderboard(&entries));
        let (best, best_entry) = runs
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No clustering candidates for {n} rows"))?;

        let store = ModelStore::new(self.models_dir.join(format!("{name}_{}", TaskType::Clustering)))?;
        store.save_config(cfg)?;
        store.save_pipeline(&StoredPipeline {
            task:       TaskType::Clustering,
            model_name: best_entry.model.clone(),
            target:     None,
            features:   pipeline,
            labels:     None,
            model:      ModelState::KMeans {
                centroids: best.centroids.outer_iter().map(|r| r.to_vec()).collect(),
            },
        })?;
        LeaderboardLogger::new(store.dir())?.write(&entries)?;
        let assignments = store.save_assignments(table, &best.labels)?;
        tracing::info!(
            "Best model: {} | assignments written to '{}'",
            best_entry.model,
            assignments.display()
        );

        Ok(TrainedModel {
            name:        name.to_string(),
            task:        TaskType::Clustering,
            directory:   store.dir().to_path_buf(),
            best_model:  best_entry.model,
            leaderboard: entries,
            holdout:     Vec::new(),
        })
    }
}

/// Keep rows with a target value and encode that target.
fn prepare_target(
    table:      &Table,
    target_idx: usize,
    task:       TaskType,
) -> Result<(Table, Vec<f32>, Option<LabelEncoder>)> {
    let keep: Vec<usize> = (0..table.n_rows())
        .filter(|&r| !is_missing(&table.rows[r][target_idx]))
        .collect();
    let dropped = table.n_rows() - keep.len();
    if dropped > 0 {
        tracing::warn!("Dropping {} rows with a missing target", dropped);
    }
    let data = table.select_rows(&keep);

    match task {
        TaskType::Classification => {
            let encoder = LabelEncoder::fit(data.column(target_idx));
            if encoder.len() < 2 {
                anyhow::bail!(
                    "Classification needs at least 2 classes in '{}', found {}",
                    data.headers[target_idx],
                    encoder.len()
                );
            }
            let y = data
                .column(target_idx)
                .map(|l| encoder.encode(l).map_or(0.0, |i| i as f32))
                .collect();
            Ok((data, y, Some(encoder)))
        }
        _ => {
            let mut y = Vec::with_capacity(data.n_rows());
            for (row, cell) in data.column(target_idx).enumerate() {
                let value = parse_number(cell).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Regression target '{}' has non-numeric value '{}' (row {})",
                        data.headers[target_idx],
                        cell,
                        row + 1
                    )
                })?;
                let value = value as f32;
                if !value.is_finite() {
                    anyhow::bail!(
                        "Regression target '{}' value '{}' (row {}) is out of range",
                        data.headers[target_idx],
                        cell.trim(),
                        row + 1
                    );
                }
                y.push(value);
            }
            Ok((data, y, None))
        }
    }
}

/// Read the saved model back and predict the first row, so a
/// model directory that cannot be reloaded fails the run.
fn check_reload(store: &ModelStore, data: &Table) -> Result<f32> {
    let (stored, model) = store.load_estimator()?;
    let x = stored.features.transform(data, &[0]);
    let value = model.predict(&x)?.first().copied().unwrap_or(f32::NAN);

    match stored.labels.as_ref().and_then(|l| l.decode(value.round() as usize)) {
        Some(label) => tracing::debug!("Reloaded '{}' predicts '{}' for row 1", stored.model_name, label),
        None => tracing::debug!("Reloaded '{}' predicts {:.4} for row 1", stored.model_name, value),
    }
    Ok(value)
}

/// Cross-validate each candidate and return them best first.
pub fn compare_models(
    task:       TaskType,
    candidates: &[Candidate],
    x:          &Array2<f32>,
    y:          &[f32],
    n_classes:  usize,
    cfg:        &AutoMlConfig,
) -> Result<Vec<(Candidate, LeaderboardEntry)>> {
    let folds = k_fold(x.nrows(), cfg.folds, cfg.session_id);
    if folds.is_empty() {
        anyhow::bail!("Cross-validation needs at least 2 training rows");
    }
    tracing::info!(
        "Comparing {} models with {}-fold cross-validation",
        candidates.len(),
        folds.len()
    );

    let net = cfg.net_settings();
    let mut board = Vec::with_capacity(candidates.len());

    for &candidate in candidates {
        let mut sums: Vec<(String, f64)> = Vec::new();
        for fold in &folds {
            let mut model = candidate.build(n_classes, &net);
            model.fit(&take_rows(x, &fold.train), &take(y, &fold.train))?;
            let predicted = model.predict(&take_rows(x, &fold.validation))?;
            let scores = score(task, &take(y, &fold.validation), &predicted, n_classes);

            if sums.is_empty() {
                sums = scores;
            } else {
                for (acc, (_, v)) in sums.iter_mut().zip(scores) {
                    acc.1 += v;
                }
            }
        }
        let metrics = sums
            .into_iter()
            .map(|(name, total)| (name, total / folds.len() as f64))
            .collect();
        let entry = LeaderboardEntry { model: candidate.display_name().to_string(), metrics };
        tracing::debug!("{}: {}", entry.model, describe(&entry.metrics));
        board.push((candidate, entry));
    }

    let key = rank_metric(task);
    // stable sort keeps candidate order on ties
    board.sort_by(|a, b| rank_value(&b.1, key).total_cmp(&rank_value(&a.1, key)));
    Ok(board)
}

/// Metrics for one set of predictions, in leaderboard column order.
pub fn score(task: TaskType, y_true: &[f32], y_pred: &[f32], n_classes: usize) -> Vec<(String, f64)> {
    match task {
        TaskType::Classification => vec![
            ("Accuracy".into(), metrics::accuracy(y_true, y_pred)),
            ("F1".into(),       metrics::f1_macro(y_true, y_pred, n_classes)),
        ],
        _ => vec![
            ("MAE".into(),  metrics::mae(y_true, y_pred)),
            ("MSE".into(),  metrics::mse(y_true, y_pred)),
            ("RMSE".into(), metrics::rmse(y_true, y_pred)),
            ("R2".into(),   metrics::r2(y_true, y_pred)),
        ],
    }
}

/// The metric the leaderboard is sorted by.
pub fn rank_metric(task: TaskType) -> &'static str {
    match task {
        TaskType::Classification => "Accuracy",
        TaskType::Regression     => "R2",
        TaskType::Clustering     => "Silhouette",
    }
}

/// NaN scores rank below every real score.
fn rank_value(entry: &LeaderboardEntry, metric: &str) -> f64 {
    entry
        .metric(metric)
        .filter(|v| !v.is_nan())
        .unwrap_or(f64::NEG_INFINITY)
}

fn describe(scores: &[(String, f64)]) -> String {
    scores
        .iter()
        .map(|(n, v)| format!("{n}={v:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn quick_config() -> AutoMlConfig {
        AutoMlConfig { folds: 3, epochs: 30, batch_size: 16, learning_rate: 5e-2, ..AutoMlConfig::default() }
    }

    fn to_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
        Table::new(headers.iter().map(|s| s.to_string()).collect(), rows)
    }

    /// Two well separated classes with a noise column.
    fn classification_table() -> Table {
        let mut rng = StdRng::seed_from_u64(3);
        let rows = (0..40)
            .map(|i| {
                let class = i % 2;
                let centre = if class == 0 { -3.0 } else { 3.0 };
                vec![
                    format!("{:.3}", centre + rng.gen_range(-1.0..1.0)),
                    format!("{:.3}", rng.gen_range(-1.0..1.0)),
                    if class == 0 { "no".to_string() } else { "yes".to_string() },
                ]
            })
            .collect();
        to_table(&["signal", "noise", "label"], rows)
    }

    fn regression_table() -> Table {
        let rows = (0..30)
            .map(|i| {
                let x = i as f64 / 3.0;
                vec![format!("{x:.3}"), format!("{:.3}", 2.0 * x + 1.0)]
            })
            .collect();
        to_table(&["x", "y"], rows)
    }

    #[test]
    fn test_classification_run_writes_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let automl = AutoMl::new(quick_config(), dir.path());
        let trained = automl
            .run(&classification_table(), "blobs", "label", TaskType::Classification)
            .unwrap();

        assert_eq!(trained.leaderboard.len(), 5);
        assert_ne!(trained.best_model, "Dummy Classifier");
        let best_acc = trained.leaderboard[0].metric("Accuracy").unwrap();
        assert!(best_acc > 0.9, "best accuracy {best_acc}");
        // leaderboard is sorted
        for pair in trained.leaderboard.windows(2) {
            assert!(pair[0].metric("Accuracy") >= pair[1].metric("Accuracy"));
        }

        let model_dir = dir.path().join("blobs_classification");
        assert_eq!(trained.directory, model_dir);
        assert!(model_dir.join("pipeline.json").exists());
        assert!(model_dir.join("train_config.json").exists());
        assert!(model_dir.join("leaderboard.csv").exists());

        let store = ModelStore::new(&model_dir).unwrap();
        let stored = store.load_pipeline().unwrap();
        assert_eq!(stored.labels.as_ref().unwrap().classes, vec!["no", "yes"]);
        assert_eq!(stored.target.as_deref(), Some("label"));

        // the reloaded model labels a clear "yes" row
        let row = to_table(&["signal", "noise", "label"], vec![vec!["3.0".into(), "0.0".into(), "yes".into()]]);
        let class = check_reload(&store, &row).unwrap();
        assert_eq!(stored.labels.unwrap().decode(class as usize), Some("yes"));
    }

    #[test]
    fn test_regression_prefers_a_real_model() {
        let dir = tempfile::tempdir().unwrap();
        let automl = AutoMl::new(quick_config(), dir.path());
        let trained = automl.run(&regression_table(), "line", "y", TaskType::Regression).unwrap();

        assert_ne!(trained.best_model, "Dummy Regressor");
        assert!(trained.leaderboard[0].metric("R2").unwrap() > 0.8);
        assert_eq!(trained.holdout.len(), 4);
    }

    #[test]
    fn test_clustering_picks_k_and_writes_assignments() {
        let rows: Vec<Vec<String>> = [(0.0, 0.0), (0.1, 0.2), (0.2, 0.1), (8.0, 8.0), (8.1, 7.9), (7.9, 8.2)]
            .iter()
            .map(|(a, b)| vec![format!("{a}"), format!("{b}")])
            .collect();
        let table = to_table(&["a", "b"], rows);

        let dir = tempfile::tempdir().unwrap();
        let trained = AutoMl::new(quick_config(), dir.path())
            .run(&table, "pts", "", TaskType::Clustering)
            .unwrap();
        assert_eq!(trained.best_model, "K-Means (k=2)");
        assert!(dir.path().join("pts_clustering/assignments.csv").exists());
    }

    #[test]
    fn test_missing_target_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AutoMl::new(quick_config(), dir.path())
            .run(&regression_table(), "line", "price", TaskType::Regression)
            .unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_non_numeric_regression_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AutoMl::new(quick_config(), dir.path())
            .run(&classification_table(), "blobs", "label", TaskType::Regression)
            .unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_rows_with_missing_target_are_dropped() {
        let mut table = regression_table();
        for r in [0, 7, 12, 29] {
            table.rows[r][1] = if r % 2 == 0 { "NA".into() } else { String::new() };
        }

        let (data, y, labels) = prepare_target(&table, 1, TaskType::Regression).unwrap();
        assert_eq!(data.n_rows(), 26);
        assert_eq!(y.len(), 26);
        assert!(labels.is_none());
        assert!(y.iter().all(|v| v.is_finite()));

        let dir = tempfile::tempdir().unwrap();
        let trained = AutoMl::new(quick_config(), dir.path())
            .run(&table, "gappy", "y", TaskType::Regression)
            .unwrap();
        assert_eq!(trained.leaderboard.len(), 4);
        let stored = ModelStore::new(&trained.directory).unwrap().load_pipeline().unwrap();
        assert_eq!(stored.target.as_deref(), Some("y"));
    }

    #[test]
    fn test_target_too_large_for_f32_is_an_error() {
        let mut table = regression_table();
        table.rows[3][1] = "1e300".into();
        let err = prepare_target(&table, 1, TaskType::Regression).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let entry = |model: &str, r2: f64| LeaderboardEntry { model: model.into(), metrics: vec![("R2".into(), r2)] };
        let mut board = vec![entry("broken", f64::NAN), entry("ok", 0.5), entry("bad", -3.0)];
        board.sort_by(|a, b| rank_value(b, "R2").total_cmp(&rank_value(a, "R2")));
        let order: Vec<&str> = board.iter().map(|e| e.model.as_str()).collect();
        assert_eq!(order, vec!["ok", "bad", "broken"]);
    }

    #[test]
    fn test_single_class_is_an_error() {
        let rows = (0..6).map(|i| vec![format!("{i}"), "same".to_string()]).collect();
        let dir = tempfile::tempdir().unwrap();
        let err = AutoMl::new(quick_config(), dir.path())
            .run(&to_table(&["x", "y"], rows), "one", "y", TaskType::Classification)
            .unwrap_err();
        assert!(err.to_string().contains("at least 2 classes"));
    }
}
