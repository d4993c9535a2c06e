// ============================================================
// Layer 2 — Submit Use Case
// ============================================================
// Batch inference over the test directory:
//   1. Collect every .wav under the test dir, sorted by name
//   2. Restore the trained model from a checkpoint
//   3. Fingerprint and classify the clips in fixed-size batches
//   4. Map class indices to submission words
//   5. Write the fname,label CSV

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::data::features::FeatureExtractor;
use crate::data::wav;
use crate::domain::vocabulary::Vocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::submission::write_submission;
use crate::ml::inferencer::Inferencer;

pub struct SubmitConfig {
    pub test_dir:       String,
    pub checkpoint_dir: String,

    /// Explicit checkpoint stem, or None for the latest one
    pub checkpoint: Option<String>,
    pub output:     String,
    pub batch_size: usize,
}

pub struct SubmitUseCase {
    config: SubmitConfig,
}

impl SubmitUseCase {
    pub fn new(config: SubmitConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Collect the test clips ────────────────────────────────────
        let wavs = collect_test_wavs(Path::new(&cfg.test_dir))?;
        tracing::info!("Found {} test clips in '{}'", wavs.len(), cfg.test_dir);

        // ── Step 2: Restore model + feature layout from the checkpoint ───────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        let train_cfg = ckpt_manager.load_config()?;
        let vocab = if train_cfg.wanted_only {
            Vocabulary::wanted()
        } else {
            Vocabulary::full()
        };
        let inferencer =
            Inferencer::from_checkpoint(&ckpt_manager, cfg.checkpoint.as_deref(), vocab.len())?;
        let extractor = Arc::new(FeatureExtractor::new(train_cfg.features.clone()));
        let desired = train_cfg.features.desired_samples();

        // ── Step 3+4: Classify in batches ─────────────────────────────────────
        let mut rows: Vec<(String, String)> = Vec::with_capacity(wavs.len());

        for (done, chunk) in wavs.chunks(cfg.batch_size).enumerate() {
            let mut fingerprints = Vec::with_capacity(chunk.len());
            for path in chunk {
                let samples = wav::read_clip(path, desired)
                    .with_context(|| format!("Cannot decode '{}'", path.display()))?;
                fingerprints.push(extractor.fingerprint(&samples));
            }

            let predicted = inferencer.predict(&fingerprints)?;
            for (path, class) in chunk.iter().zip(predicted) {
                let fname = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                rows.push((fname, vocab.submission_word(class)));
            }

            let clips_done = (done * cfg.batch_size + chunk.len()).min(wavs.len());
            if clips_done % 6_400 == 0 || clips_done == wavs.len() {
                tracing::info!("Classified {}/{} clips", clips_done, wavs.len());
            }
        }

        // ── Step 5: Write the CSV ─────────────────────────────────────────────
        write_submission(Path::new(&cfg.output), &rows)?;

        let silence = rows.iter().filter(|(_, l)| l == "silence").count();
        let unknown = rows.iter().filter(|(_, l)| l == "unknown").count();
        tracing::info!(
            "Submission done: {} rows ({} silence, {} unknown)",
            rows.len(),
            silence,
            unknown,
        );
        Ok(())
    }
}

/// Every .wav directly under the test dir, sorted by file name so
/// the submission row order is stable across runs.
fn collect_test_wavs(test_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut wavs: Vec<PathBuf> = fs::read_dir(test_dir)
        .with_context(|| format!("Cannot read test directory '{}'", test_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("wav"))
        .collect();
    wavs.sort();

    anyhow::ensure!(
        !wavs.is_empty(),
        "No .wav files found in '{}'",
        test_dir.display()
    );
    Ok(wavs)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavs_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip_b.wav"), b"").unwrap();
        fs::write(dir.path().join("clip_a.wav"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let wavs = collect_test_wavs(dir.path()).unwrap();
        let names: Vec<_> = wavs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["clip_a.wav", "clip_b.wav"]);
    }

    #[test]
    fn empty_test_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_test_wavs(dir.path()).is_err());
    }
}
