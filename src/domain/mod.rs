// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define the core concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O beyond path inspection
//   - Only plain Rust structs, enums, and constants
//
// Why keep this layer pure?
//   - Easy to unit test (no GPU, no audio files needed)
//   - The vocabulary and the partitioning rule are contracts the
//     whole pipeline depends on — they must be trivially auditable
//
// Reference: Rust Book §5 (Structs), §7 (Modules)

// The fixed list of recognised word labels
pub mod vocabulary;

// Deterministic training / validation / testing assignment
pub mod partition;

// A discovered (file, label) pair
pub mod sample;
