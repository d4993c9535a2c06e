// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::Result;
use burn::prelude::*;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Arch, KwsModel, KwsModelConfig};

type InferBackend = burn::backend::Wgpu;

/// Loads a trained model and predicts class indices for
/// fingerprint batches.
pub struct Inferencer {
    model:  KwsModel<InferBackend>,
    frames: usize,
    coeffs: usize,
    device: burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    /// Rebuild the architecture from the saved training config and
    /// restore the requested checkpoint (or the latest one).
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        checkpoint:   Option<&str>,
        label_count:  usize,
    ) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg = ckpt_manager.load_config()?;
        let arch: Arch = cfg.model.parse()?;

        // Dropout off — inference is deterministic.
        let model: KwsModel<InferBackend> =
            KwsModelConfig::new(arch, label_count, 0.0).init(&device);
        let model = ckpt_manager.load_model(model, checkpoint, &device)?;
        tracing::info!("Model loaded from checkpoint ({arch})");

        Ok(Self {
            model,
            frames: cfg.features.frame_count(),
            coeffs: cfg.features.coefficient_count,
            device,
        })
    }

    /// Predict one class index per fingerprint. Every fingerprint
    /// must have the same frames × coeffs layout as training.
    pub fn predict(&self, fingerprints: &[Vec<f32>]) -> Result<Vec<usize>> {
        let batch_size = fingerprints.len();
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        let flat: Vec<f32> = fingerprints.iter().flatten().copied().collect();
        anyhow::ensure!(
            flat.len() == batch_size * self.frames * self.coeffs,
            "Fingerprint size mismatch: got {} values for {} clips of {}x{}",
            flat.len(), batch_size, self.frames, self.coeffs,
        );

        let features = Tensor::<InferBackend, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, 1, self.frames, self.coeffs]);

        let logits = self.model.forward(features);
        let predicted: Vec<i64> = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap_or_default();

        Ok(predicted.into_iter().map(|p| p as usize).collect())
    }
}
