// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits describing what the pipeline
// works with. No HTTP, no burn, no file formats in here.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Reports, sessions and model artifacts returned by adapters
pub mod artifacts;

// classification / regression / clustering
pub mod task;

// Ports that the adapters implement
pub mod traits;
