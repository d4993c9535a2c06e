// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What lands in the checkpoint directory during a run:
//   ep-001-vl-2.8731.mpk.gz   ← weights after epoch 1
//   ep-002-vl-1.9402.mpk.gz   ← weights after epoch 2
//   ...
//   latest.json               ← stem of the newest checkpoint
//   train_config.json         ← architecture + feature settings
//
// The directory is append-only: every epoch gets its own file, named
// by epoch number and validation loss so a good epoch can be picked
// by eye, and nothing is ever rewritten in place.
//
// Why save the config separately?
//   Loading weights requires rebuilding the exact model first
//   (architecture, class count) and recomputing identical features
//   (frame/coefficient layout). Without the config, a checkpoint is
//   just an opaque blob.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::KwsModel;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// File stem for a given epoch/loss, e.g. "ep-036-vl-0.2950".
    pub fn checkpoint_stem(epoch: usize, val_loss: f64) -> String {
        format!("ep-{epoch:03}-vl-{val_loss:.4}")
    }

    /// Save model weights for a given epoch and update the latest
    /// pointer. Returns the checkpoint stem.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model:    &KwsModel<B>,
        epoch:    usize,
        val_loss: f64,
    ) -> Result<String> {
        let stem = Self::checkpoint_stem(epoch, val_loss);
        // The recorder appends its own extension (.mpk.gz)
        let path = self.dir.join(&stem);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest.json");
        fs::write(&latest_path, serde_json::to_string(&stem)?)
            .with_context(|| "Failed to write latest.json")?;

        tracing::debug!("Saved checkpoint: {}", stem);
        Ok(stem)
    }

    /// Load weights into a freshly built model.
    ///
    /// `checkpoint` picks an explicit stem (e.g. "ep-036-vl-0.2950");
    /// `None` follows the latest pointer. The model architecture must
    /// match the saved record or loading fails.
    pub fn load_model<B: Backend>(
        &self,
        model:      KwsModel<B>,
        checkpoint: Option<&str>,
        device:     &B::Device,
    ) -> Result<KwsModel<B>> {
        let stem = match checkpoint {
            Some(s) => s.to_string(),
            None    => self.latest_stem()?,
        };
        let path = self.dir.join(&stem);

        tracing::info!("Loading checkpoint '{}'", stem);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    /// Must be called before training starts so a crash mid-run
    /// still leaves usable checkpoints behind.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'submit'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest.json and return the newest checkpoint stem.
    fn latest_stem(&self) -> Result<String> {
        let path = self.dir.join("latest.json");
        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest.json'. Have you run 'train' first?"
            })?;
        Ok(serde_json::from_str::<String>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_sort_by_epoch_and_carry_the_loss() {
        assert_eq!(CheckpointManager::checkpoint_stem(1, 2.87311), "ep-001-vl-2.8731");
        assert_eq!(CheckpointManager::checkpoint_stem(36, 0.295), "ep-036-vl-0.2950");
        // Zero-padded epochs keep lexicographic order = training order.
        let a = CheckpointManager::checkpoint_stem(9, 1.0);
        let b = CheckpointManager::checkpoint_stem(10, 1.0);
        assert!(a < b);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());

        let cfg = TrainConfig::default();
        manager.save_config(&cfg).unwrap();
        let loaded = manager.load_config().unwrap();

        assert_eq!(loaded.model, cfg.model);
        assert_eq!(loaded.epochs, cfg.epochs);
        assert_eq!(loaded.features.coefficient_count, cfg.features.coefficient_count);
    }

    #[test]
    fn missing_latest_pointer_is_a_helpful_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let err = manager.latest_stem().unwrap_err();
        assert!(err.to_string().contains("train"), "{err}");
    }
}
