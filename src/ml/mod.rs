// ============================================================
// Layer 5 - ML / Model Layer
// ============================================================
// Model fitting and selection. Burn is only imported here and
// in the data layer's dataset/batcher.
//
//   model.rs      - TabularNet: linear layer or one-hidden-layer
//                   MLP, with cross-entropy / MSE heads
//
//   trainer.rs    - Adam training loop over Burn's DataLoader,
//                   prediction, weight persistence
//
//   estimators.rs - The Estimator trait, the candidate list and
//                   the non-neural candidates (baselines, k-NN,
//                   Gaussian naive Bayes)
//
//   kmeans.rs     - K-Means with k-means++ seeding
//
//   metrics.rs    - Accuracy, F1, MAE, MSE, RMSE, R2, silhouette
//
//   automl.rs     - Cross-validated comparison, leaderboard,
//                   finalisation and persistence
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Burn network for tabular features
pub mod model;

/// Training loop and neural estimator
pub mod trainer;

/// Candidate models and the Estimator trait
pub mod estimators;

/// K-Means clustering
pub mod kmeans;

/// Scoring functions
pub mod metrics;

/// Model comparison and selection
pub mod automl;
