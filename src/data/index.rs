// ============================================================
// Layer 4 — Data Index
// ============================================================
// Scans the training directory tree and builds the partitioned
// sample index the rest of the pipeline runs on.
//
// Layout expected on disk:
//
//   <data_dir>/
//     yes/xxxx_nohash_0.wav        ← one folder per word
//     no/yyyy_nohash_0.wav
//     _background_noise_/*.wav     ← long noise recordings (optional)
//
// After the scan, each partition is topped up with:
//   - silence records: an arbitrary training file, muted later
//     (ceil(set_size * silence% / 100) of them)
//   - unknown records: a random draw from the out-of-vocabulary
//     words (ceil(set_size * unknown% / 100) of them)
//
// The shuffles use a fixed seed so re-running produces the exact
// same index — training runs are reproducible end to end.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::wav;
use crate::domain::partition::Partition;
use crate::domain::sample::SampleRecord;
use crate::domain::vocabulary::{Vocabulary, SILENCE_LABEL};

/// Folder holding long noise recordings, skipped during the scan.
pub const BACKGROUND_NOISE_DIR: &str = "_background_noise_";

/// Fixed seed for the silence/unknown draws.
const INDEX_SEED: u64 = 59_185;

/// Share settings for the index build.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Share of each partition that should be silence
    pub silence_percentage: f64,

    /// Share of each partition drawn from out-of-vocabulary words
    pub unknown_percentage: f64,

    /// Share of hashed files assigned to validation
    pub validation_percentage: f64,

    /// Share of hashed files assigned to testing
    pub testing_percentage: f64,
}

/// The partitioned sample lists plus the loaded background noise.
#[derive(Debug)]
pub struct DataIndex {
    training:   Vec<SampleRecord>,
    validation: Vec<SampleRecord>,
    testing:    Vec<SampleRecord>,
    pseudo:     Vec<SampleRecord>,

    /// Decoded background noise clips, full length
    background: Vec<Vec<f32>>,
}

impl DataIndex {
    /// Scan the data directories and build the index.
    ///
    /// Fails if no wav files are found, or if a vocabulary word has no
    /// folder — a missing class would silently train a lopsided model.
    pub fn scan(
        data_dirs: &[PathBuf],
        vocab:     &Vocabulary,
        settings:  &IndexSettings,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(INDEX_SEED);

        let mut sets: HashMap<Partition, Vec<SampleRecord>> = HashMap::new();
        let mut unknown: HashMap<Partition, Vec<SampleRecord>> = HashMap::new();
        // BTreeMap so the "words we saw" error output is stable.
        let mut all_words: BTreeMap<String, usize> = BTreeMap::new();

        for data_dir in data_dirs {
            for (word, wav_path) in scan_word_folders(data_dir)? {
                *all_words.entry(word.clone()).or_insert(0) += 1;
                let partition = Partition::of(
                    &wav_path,
                    settings.validation_percentage,
                    settings.testing_percentage,
                );
                let record = SampleRecord::new(wav_path, word.clone());
                if vocab.contains(&word) {
                    sets.entry(partition).or_default().push(record);
                } else {
                    unknown.entry(partition).or_default().push(record);
                }
            }
        }

        if all_words.is_empty() {
            bail!(
                "No .wav files found under {:?} — expected <dir>/<word>/*.wav",
                data_dirs
            );
        }
        for word in vocab.labels().iter().skip(2) {
            if !all_words.contains_key(word) {
                bail!(
                    "Expected to find '{}' in the scanned labels but only found: {}",
                    word,
                    all_words.keys().cloned().collect::<Vec<_>>().join(", ")
                );
            }
        }

        let mut training   = sets.remove(&Partition::Training).unwrap_or_default();
        let mut validation = sets.remove(&Partition::Validation).unwrap_or_default();
        let mut testing    = sets.remove(&Partition::Testing).unwrap_or_default();
        let mut pseudo     = sets.remove(&Partition::Pseudo).unwrap_or_default();

        // Any readable file works for silence — it is muted before use.
        let silence_path = training
            .first()
            .map(|r| r.path.clone())
            .context("Training partition is empty — cannot synthesise silence records")?;

        for (partition, records) in [
            (Partition::Training,   &mut training),
            (Partition::Validation, &mut validation),
            (Partition::Testing,    &mut testing),
            (Partition::Pseudo,     &mut pseudo),
        ] {
            let set_size = records.len();

            let silence_count =
                (set_size as f64 * settings.silence_percentage / 100.0).ceil() as usize;
            for _ in 0..silence_count {
                records.push(SampleRecord::new(silence_path.clone(), SILENCE_LABEL));
            }

            let mut candidates = unknown.remove(&partition).unwrap_or_default();
            candidates.shuffle(&mut rng);
            let unknown_count =
                (set_size as f64 * settings.unknown_percentage / 100.0).ceil() as usize;
            records.extend(candidates.into_iter().take(unknown_count));

            records.shuffle(&mut rng);
        }

        let background = load_background_noise(&data_dirs[0])?;

        tracing::info!(
            "Index ready: {} training, {} validation, {} testing, {} pseudo, {} noise clips",
            training.len(),
            validation.len(),
            testing.len(),
            pseudo.len(),
            background.len(),
        );

        Ok(Self { training, validation, testing, pseudo, background })
    }

    pub fn partition(&self, partition: Partition) -> &[SampleRecord] {
        match partition {
            Partition::Training   => &self.training,
            Partition::Validation => &self.validation,
            Partition::Testing    => &self.testing,
            Partition::Pseudo     => &self.pseudo,
        }
    }

    pub fn set_size(&self, partition: Partition) -> usize {
        self.partition(partition).len()
    }

    pub fn background(&self) -> &[Vec<f32>] {
        &self.background
    }

    /// Hand the pieces over to the datasets without cloning the noise.
    pub fn into_parts(self) -> (Vec<SampleRecord>, Vec<SampleRecord>, Vec<SampleRecord>, Vec<SampleRecord>, Vec<Vec<f32>>) {
        (self.training, self.validation, self.testing, self.pseudo, self.background)
    }
}

/// Walk `<data_dir>/<word>/*.wav`, skipping the noise folder.
/// Entries are sorted so the scan order is platform-independent.
fn scan_word_folders(data_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();

    let mut word_dirs: Vec<PathBuf> = fs::read_dir(data_dir)
        .with_context(|| format!("Cannot read data directory '{}'", data_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    word_dirs.sort();

    for word_dir in word_dirs {
        let word = match word_dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        if word == BACKGROUND_NOISE_DIR {
            continue;
        }

        let mut wavs: Vec<PathBuf> = fs::read_dir(&word_dir)
            .with_context(|| format!("Cannot read word folder '{}'", word_dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("wav"))
            .collect();
        wavs.sort();

        for wav_path in wavs {
            found.push((word.clone(), wav_path));
        }
    }

    Ok(found)
}

/// Load every clip under `_background_noise_`, full length.
///
/// A missing folder just means no noise augmentation; a folder that
/// exists but holds no wavs is a setup mistake and fails loudly.
fn load_background_noise(data_dir: &Path) -> Result<Vec<Vec<f32>>> {
    let noise_dir = data_dir.join(BACKGROUND_NOISE_DIR);
    if !noise_dir.exists() {
        tracing::info!("No '{}' folder — noise augmentation off", noise_dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&noise_dir)
        .with_context(|| format!("Cannot read '{}'", noise_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("wav"))
        .collect();
    paths.sort();

    let mut clips = Vec::with_capacity(paths.len());
    for path in &paths {
        let samples = wav::read(path)?;
        tracing::debug!("Noise clip '{}': {} samples", path.display(), samples.len());
        clips.push(samples);
    }

    if clips.is_empty() {
        bail!("No background wav files were found in '{}'", noise_dir.display());
    }
    Ok(clips)
}
