// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code apart from
// the Dataset/Batcher impls in the data layer.
//
// What's in this layer:
//
//   model.rs      — The convolutional classifier topologies,
//                   selected by name (conv-2d, conv-2d-fast):
//                   Conv2d + BatchNorm + ReLU + MaxPool blocks over
//                   the MFCC map, adaptive pooling, and a linear
//                   classification head
//
//   trainer.rs    — The training loop: epoch-indexed learning-rate
//                   schedule, Adam updates, validation with a
//                   confusion matrix, metrics CSV, checkpoint per
//                   epoch
//
//   inferencer.rs — Loads a checkpoint, rebuilds the architecture
//                   from the saved config, and predicts class
//                   indices for fingerprint batches
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Convolutional keyword-spotting architectures
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts labels
pub mod inferencer;
