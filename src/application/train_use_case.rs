// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Build the vocabulary       (Layer 3 - domain)
//   Step 2: Scan + partition the data  (Layer 4 - data)
//   Step 3: Build feature extractor    (Layer 4 - data)
//   Step 4: Build Burn datasets        (Layer 4 - data)
//   Step 5: Save config                (Layer 6 - infra)
//   Step 6: Run training loop          (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    augment::AugmentSettings,
    dataset::SpeechDataset,
    features::{FeatureExtractor, FeatureSettings},
    index::{DataIndex, IndexSettings},
};
use crate::domain::vocabulary::Vocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
// The #[derive(Serialize, Deserialize)] macros from serde handle
// reading/writing this struct to JSON automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dirs:      Vec<String>,
    pub checkpoint_dir: String,

    /// Architecture name, parsed into an `Arch` by the trainer
    pub model:      String,
    pub batch_size: usize,
    pub epochs:     usize,
    pub base_lr:    f64,
    pub dropout:    f64,

    /// Train on the 10 target words only; the default is to classify
    /// all 30 words and collapse to "unknown" at submission time.
    pub wanted_only: bool,

    /// Chance that a training item is swapped for a pseudo-labelled one
    pub pseudo_frequency: f64,

    pub silence_percentage:    f64,
    pub unknown_percentage:    f64,
    pub validation_percentage: f64,
    pub testing_percentage:    f64,

    pub features: FeatureSettings,
    pub augment:  AugmentSettings,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dirs:      vec!["data/train/audio".to_string()],
            checkpoint_dir: "checkpoints".to_string(),
            model:          "conv-2d".to_string(),
            batch_size:     100,
            epochs:         40,
            base_lr:        1e-3,
            dropout:        0.1,
            wanted_only:    false,

            pseudo_frequency: 0.0,

            silence_percentage:    15.0,
            unknown_percentage:    7.0,
            validation_percentage: 10.0,
            testing_percentage:    0.0,

            features: FeatureSettings::default(),
            augment:  AugmentSettings::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Build the vocabulary ──────────────────────────────────────
        // Full vocabulary by default: a model that can tell "bed" from
        // "bird" produces a much better "unknown" class than one trained
        // on a single lumped bucket.
        let vocab = Arc::new(if cfg.wanted_only {
            Vocabulary::wanted()
        } else {
            Vocabulary::full()
        });
        tracing::info!("Vocabulary: {} classes", vocab.len());

        // ── Step 2: Scan and partition the training data ──────────────────────
        let data_dirs: Vec<PathBuf> = cfg.data_dirs.iter().map(PathBuf::from).collect();
        let index_settings = IndexSettings {
            silence_percentage:    cfg.silence_percentage,
            unknown_percentage:    cfg.unknown_percentage,
            validation_percentage: cfg.validation_percentage,
            testing_percentage:    cfg.testing_percentage,
        };
        let index = DataIndex::scan(&data_dirs, &vocab, &index_settings)?;
        let (training, validation, _testing, pseudo, background) = index.into_parts();

        // ── Step 3: Build the feature extractor ───────────────────────────────
        let extractor  = Arc::new(FeatureExtractor::new(cfg.features.clone()));
        let background = Arc::new(background);
        tracing::info!(
            "Fingerprints: {} frames x {} coefficients",
            cfg.features.frame_count(),
            cfg.features.coefficient_count,
        );

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        // SpeechDataset implements Burn's Dataset trait so the DataLoader
        // can call .get(index) and .len() on it
        let train_dataset = SpeechDataset::training(
            training,
            pseudo,
            background,
            vocab.clone(),
            extractor.clone(),
            cfg.augment.clone(),
            cfg.pseudo_frequency,
        );
        let val_dataset = SpeechDataset::evaluation(validation, vocab.clone(), extractor);
        tracing::info!(
            "Datasets: {} train, {} validation",
            train_dataset.sample_count(),
            val_dataset.sample_count(),
        );

        // ── Step 5: Save config for inference ─────────────────────────────────
        // The inferencer needs to know the architecture and the exact
        // feature layout to rebuild the model
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, vocab, train_dataset, val_dataset, ckpt_manager)?;

        Ok(())
    }
}
