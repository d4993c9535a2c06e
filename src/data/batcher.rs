// ============================================================
// Layer 4 — Speech Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<SpeechItem>
// into GPU-ready tensors.
//
// How batching works here:
//   Input:  Vec of N SpeechItems, each a fingerprint of
//           frames × coeffs values plus a class index
//   Output: SpeechBatch with
//           features: [N, 1, frames, coeffs]  (one input channel)
//           targets:  [N]
//
// All fingerprints have the same length because every clip is
// padded/truncated to the same duration before extraction — so
// batching is a flatten followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::SpeechItem;
use crate::data::features::FeatureSettings;

// ─── SpeechBatch ──────────────────────────────────────────────────────────────
/// A batch of fingerprints ready for the model forward pass.
///
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct SpeechBatch<B: Backend> {
    /// MFCC maps — shape: [batch_size, 1, frames, coeffs]
    pub features: Tensor<B, 4>,

    /// Ground truth class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── SpeechBatcher ────────────────────────────────────────────────────────────
/// Holds the target device plus the fingerprint layout so the flat
/// feature vectors can be reshaped into 2-D maps.
#[derive(Clone, Debug)]
pub struct SpeechBatcher<B: Backend> {
    device: B::Device,
    frames: usize,
    coeffs: usize,
}

impl<B: Backend> SpeechBatcher<B> {
    pub fn new(device: B::Device, settings: &FeatureSettings) -> Self {
        Self {
            device,
            frames: settings.frame_count(),
            coeffs: settings.coefficient_count,
        }
    }
}

impl<B: Backend> Batcher<SpeechItem, SpeechBatch<B>> for SpeechBatcher<B> {
    fn batch(&self, items: Vec<SpeechItem>) -> SpeechBatch<B> {
        let batch_size = items.len();

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|item| item.features.iter().copied())
            .collect();

        let targets_flat: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let features = Tensor::<B, 1>::from_floats(features_flat.as_slice(), &self.device)
            .reshape([batch_size, 1, self.frames, self.coeffs]);

        let targets = Tensor::<B, 1, Int>::from_ints(targets_flat.as_slice(), &self.device);

        SpeechBatch { features, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn batch_shapes_follow_the_fingerprint_layout() {
        let settings = FeatureSettings::default();
        let size = settings.fingerprint_size();

        let batcher = SpeechBatcher::<TestBackend>::new(Default::default(), &settings);
        let items = vec![
            SpeechItem { features: vec![0.0; size], label: 3 },
            SpeechItem { features: vec![1.0; size], label: 7 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.features.dims(), [2, 1, 98, 13]);
        assert_eq!(batch.targets.dims(), [2]);

        let targets: Vec<i32> = batch
            .targets
            .into_data()
            .convert::<i32>()
            .to_vec()
            .unwrap();
        assert_eq!(targets, vec![3, 7]);
    }
}
