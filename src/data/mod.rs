// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between a CSV file on disk and tensors for burn:
//
//   CSV file
//       │
//       ▼
//   CsvLoader         → resolves the filename, reads a Table
//       │
//       ▼
//   Table             → raw cells, missing values, column kinds
//       │
//       ▼
//   FeaturePipeline   → impute, standardise, one-hot encode
//       │
//       ▼
//   splitter          → train / hold-out split, k folds
//       │
//       ▼
//   TabularDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   TabularBatcher    → stacks samples into tensor batches
//
// The profiler and the editor stop after Table.

/// Reads and writes CSV files under the data directory
pub mod loader;

/// In-memory table with typed column views
pub mod table;

/// Fitted feature transforms and label encoding
pub mod preprocessor;

/// Implements Burn's Dataset trait for tabular rows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/hold-out splitting and k-fold partitioning
pub mod splitter;
