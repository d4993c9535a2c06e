// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw .wav files to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   <data_dir>/<label>/*.wav
//       │
//       ▼
//   DataIndex         → scans folders, assigns partitions,
//       │               injects silence/unknown records,
//       │               loads background noise clips
//       ▼
//   wav               → decodes one clip to mono f32 PCM
//       │
//       ▼
//   augment           → volume jitter, time shift, noise mix
//       │               (training mode only)
//       ▼
//   FeatureExtractor  → windowed FFT → mel filters → MFCC
//       │
//       ▼
//   SpeechDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   SpeechBatcher     → stacks fingerprints into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Decodes .wav files into normalised mono f32 PCM
pub mod wav;

/// Scans the data directories and builds the partitioned index
pub mod index;

/// Training-time waveform distortions
pub mod augment;

/// MFCC fingerprint extraction on top of rustfft
pub mod features;

/// Implements Burn's Dataset trait for speech clips
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
