// ============================================================
// Adapters
// ============================================================
// Concrete implementations of the Layer 3 ports. Each one is a
// thin call-through to a single engine and adds no retries,
// caching or error translation.
//
//   kaggle_downloader.rs - DatasetSource  (Kaggle REST API)
//   profiler.rs          - DataProfiler   (profiling engine)
//   editor.rs            - DataEditor     (editor server)
//   automl.rs            - ModelTrainer   (AutoML engine)

pub mod automl;
pub mod editor;
pub mod kaggle_downloader;
pub mod profiler;

pub use automl::AutoMlAdapter;
pub use editor::GridEditorAdapter;
pub use kaggle_downloader::KaggleDownloaderAdapter;
pub use profiler::TabularProfilerAdapter;
