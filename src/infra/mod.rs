// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any business layer:
//
//   checkpoint.rs — Saving and loading model weights.
//                   Uses Burn's CompactRecorder to serialise model
//                   parameters to disk. Also saves/loads the
//                   TrainConfig as JSON so inference can rebuild the
//                   exact architecture and feature layout.
//
//   metrics.rs    — Training metrics logging: per-epoch rows in a
//                   CSV file, plus the confusion matrix accumulator
//                   printed after every validation pass.
//
//   submission.rs — The `fname,label` CSV format: writing the final
//                   predictions and reading old submissions back for
//                   pseudo-label mining.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Metrics CSV logger and confusion matrix
pub mod metrics;

/// Submission CSV reading and writing
pub mod submission;
