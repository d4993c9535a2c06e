use std::sync::Arc;

use burn::data::dataset::Dataset;
use rand::Rng;

use crate::data::augment::{self, AugmentSettings};
use crate::data::features::FeatureExtractor;
use crate::data::wav;
use crate::domain::sample::SampleRecord;
use crate::domain::vocabulary::{Vocabulary, SILENCE_LABEL};

/// One fingerprinted clip, ready for batching.
#[derive(Debug, Clone)]
pub struct SpeechItem {
    /// MFCC fingerprint, frame-major: frames × coefficients
    pub features: Vec<f32>,

    /// Class index into the vocabulary
    pub label: usize,
}

/// Burn dataset over the partitioned sample records.
///
/// Feature extraction happens inside `get`, so in training mode every
/// epoch sees freshly distorted waveforms. Evaluation datasets skip
/// augmentation entirely and are fully deterministic.
pub struct SpeechDataset {
    records:          Vec<SampleRecord>,
    pseudo:           Vec<SampleRecord>,
    background:       Arc<Vec<Vec<f32>>>,
    vocab:            Arc<Vocabulary>,
    extractor:        Arc<FeatureExtractor>,
    augment:          AugmentSettings,
    pseudo_frequency: f64,
    training:         bool,
}

impl SpeechDataset {
    /// Training dataset: distortions on, optional pseudo-label mixing.
    #[allow(clippy::too_many_arguments)]
    pub fn training(
        records:          Vec<SampleRecord>,
        pseudo:           Vec<SampleRecord>,
        background:       Arc<Vec<Vec<f32>>>,
        vocab:            Arc<Vocabulary>,
        extractor:        Arc<FeatureExtractor>,
        augment:          AugmentSettings,
        pseudo_frequency: f64,
    ) -> Self {
        Self {
            records,
            pseudo,
            background,
            vocab,
            extractor,
            augment,
            pseudo_frequency,
            training: true,
        }
    }

    /// Evaluation dataset: no distortions, no pseudo mixing.
    pub fn evaluation(
        records:   Vec<SampleRecord>,
        vocab:     Arc<Vocabulary>,
        extractor: Arc<FeatureExtractor>,
    ) -> Self {
        Self {
            records,
            pseudo: Vec::new(),
            background: Arc::new(Vec::new()),
            vocab,
            extractor,
            augment: AugmentSettings::disabled(),
            pseudo_frequency: 0.0,
            training: false,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.records.len()
    }

    fn load_item(&self, record: &SampleRecord) -> SpeechItem {
        let desired = self.extractor.settings().desired_samples();
        let is_silence = record.label == SILENCE_LABEL;

        // Dataset::get cannot surface an error; a clip that fails to
        // decode degrades to all-zero samples.
        let mut samples = match wav::read_clip(&record.path, desired) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to decode '{}': {e:#}", record.path.display());
                vec![0.0; desired]
            }
        };

        if self.training {
            let mut rng = rand::thread_rng();
            augment::distort(
                &mut rng,
                &self.augment,
                &mut samples,
                is_silence,
                &self.background,
            );
        } else if is_silence {
            // Silence stays silent in evaluation too.
            augment::scale(&mut samples, 0.0);
        }

        SpeechItem {
            features: self.extractor.fingerprint(&samples),
            label:    self.vocab.index_of(&record.label),
        }
    }
}

impl Dataset<SpeechItem> for SpeechDataset {
    fn get(&self, index: usize) -> Option<SpeechItem> {
        let record = self.records.get(index)?;

        // With probability pseudo_frequency, substitute an externally
        // labelled clip so the model sees the test distribution.
        if self.training && self.pseudo_frequency > 0.0 && !self.pseudo.is_empty() {
            let mut rng = rand::thread_rng();
            if rng.gen_range(0.0..1.0) < self.pseudo_frequency {
                let pick = rng.gen_range(0..self.pseudo.len());
                return Some(self.load_item(&self.pseudo[pick]));
            }
        }

        Some(self.load_item(record))
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureSettings;
    use std::path::Path;

    fn write_loud_wav(path: &Path, len: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..len {
            writer.write_sample(12_000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn small_extractor() -> Arc<FeatureExtractor> {
        Arc::new(FeatureExtractor::new(FeatureSettings {
            sample_rate:       16_000,
            clip_duration_ms:  100,
            window_size_ms:    30,
            window_stride_ms:  10,
            mel_bins:          20,
            coefficient_count: 5,
        }))
    }

    #[test]
    fn silence_records_match_muted_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_loud_wav(&path, 1_600);

        let vocab = Arc::new(Vocabulary::new(&["yes"]));
        let extractor = small_extractor();

        let dataset = SpeechDataset::evaluation(
            vec![
                SampleRecord::new(&path, SILENCE_LABEL),
                SampleRecord::new(&path, "yes"),
            ],
            vocab,
            extractor.clone(),
        );

        let silence = dataset.get(0).unwrap();
        let spoken = dataset.get(1).unwrap();

        // The silence item must equal features of a fully muted clip.
        let desired = extractor.settings().desired_samples();
        let muted = extractor.fingerprint(&vec![0.0; desired]);
        assert_eq!(silence.features, muted);
        assert_eq!(silence.label, 0);

        // The spoken clip must differ from silence.
        assert_ne!(spoken.features, silence.features);
        assert_eq!(spoken.label, 2);
    }

    #[test]
    fn evaluation_items_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_loud_wav(&path, 1_600);

        let dataset = SpeechDataset::evaluation(
            vec![SampleRecord::new(&path, "yes")],
            Arc::new(Vocabulary::new(&["yes"])),
            small_extractor(),
        );

        let a = dataset.get(0).unwrap();
        let b = dataset.get(0).unwrap();
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let dataset = SpeechDataset::evaluation(
            Vec::new(),
            Arc::new(Vocabulary::new(&["yes"])),
            small_extractor(),
        );
        assert!(dataset.get(0).is_none());
        assert_eq!(dataset.len(), 0);
    }
}
