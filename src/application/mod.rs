// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// One orchestrator, MlUseCases, with one method per CLI
// subcommand. Each method is a single call to the matching
// port plus a log line.
//
// Rules for this layer:
//   - No data, ML or HTTP code here
//   - No printing (that's Layer 1)
//   - Adapter errors are returned exactly as raised
//
// Reference: Clean Architecture pattern
//            Rust Book §17 (Trait Objects)

// The orchestrator for download / profile / edit / train
pub mod ml_use_cases;
