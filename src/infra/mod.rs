// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the adapters:
//
//   config.rs       - PipelineConfig and per-adapter settings,
//                     built from CLI arguments
//
//   credentials.rs  - Kaggle API credential lookup
//                     (environment, then kaggle.json)
//
//   model_store.rs  - Model directory layout: training config,
//                     fitted pipeline, weights, cluster labels
//
//   metrics.rs      - Leaderboard CSV writer and log table
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Serialisable pipeline settings
pub mod config;

/// Kaggle credential discovery
pub mod credentials;

/// Trained model persistence
pub mod model_store;

/// Leaderboard CSV logger
pub mod metrics;
