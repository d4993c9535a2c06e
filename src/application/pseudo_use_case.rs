// ============================================================
// Layer 2 — Pseudo-Label Use Case
// ============================================================
// Mines extra training data out of earlier runs: test clips that
// several past submissions all labelled the same way are probably
// labelled correctly, so they get copied into a word-folder tree
// that `train` can scan like any other data directory.
//
//   1. Read two or more submission CSVs
//   2. Check they cover the same clips, in the same order
//   3. Keep rows where every submission agrees
//   4. Copy each kept clip to <out_dir>/<label>/<fname>
//
// Clips without a `_nohash_` marker land in the Pseudo partition
// on the next scan, so they only enter training through the
// pseudo_frequency mixing knob, never the validation set.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::submission::read_submission;

pub struct PseudoConfig {
    /// Two or more submission CSVs from earlier runs
    pub submissions: Vec<String>,

    /// Directory holding the test clips the CSVs refer to
    pub test_dir: String,

    /// Root of the word-folder tree to write
    pub out_dir: String,
}

pub struct PseudoUseCase {
    config: PseudoConfig,
}

impl PseudoUseCase {
    pub fn new(config: PseudoConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        anyhow::ensure!(
            cfg.submissions.len() >= 2,
            "Need at least 2 submission files to form a consensus, got {}",
            cfg.submissions.len()
        );

        // ── Step 1: Read every submission ─────────────────────────────────────
        let mut loaded = Vec::with_capacity(cfg.submissions.len());
        for path in &cfg.submissions {
            let rows = read_submission(Path::new(path))?;
            tracing::info!("Read {} rows from '{}'", rows.len(), path);
            loaded.push(rows);
        }

        // ── Step 2: The CSVs must describe the same clips ─────────────────────
        let first = &loaded[0];
        for (i, other) in loaded.iter().enumerate().skip(1) {
            anyhow::ensure!(
                other.len() == first.len(),
                "'{}' has {} rows but '{}' has {}",
                cfg.submissions[i], other.len(), cfg.submissions[0], first.len(),
            );
            for (a, b) in first.iter().zip(other) {
                anyhow::ensure!(
                    a.0 == b.0,
                    "Submission files disagree on clip order: '{}' vs '{}'",
                    a.0, b.0,
                );
            }
        }

        // ── Step 3+4: Copy the consensus clips ────────────────────────────────
        let test_dir = PathBuf::from(&cfg.test_dir);
        let out_dir = PathBuf::from(&cfg.out_dir);
        let mut copied = 0usize;

        for (row, (fname, label)) in first.iter().enumerate() {
            let unanimous = loaded[1..].iter().all(|rows| &rows[row].1 == label);
            if !unanimous {
                continue;
            }

            let src = test_dir.join(fname);
            let dst_dir = out_dir.join(label);
            fs::create_dir_all(&dst_dir)
                .with_context(|| format!("Cannot create '{}'", dst_dir.display()))?;
            fs::copy(&src, dst_dir.join(fname))
                .with_context(|| format!("Cannot copy '{}'", src.display()))?;
            copied += 1;
        }

        tracing::info!(
            "Pseudo-labelling done: {} of {} clips had consensus → '{}'",
            copied,
            first.len(),
            cfg.out_dir,
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::submission::write_submission;

    fn setup(dir: &Path, rows_a: &[(&str, &str)], rows_b: &[(&str, &str)]) -> PseudoConfig {
        let test_dir = dir.join("test");
        fs::create_dir_all(&test_dir).unwrap();
        for (fname, _) in rows_a {
            fs::write(test_dir.join(fname), b"riff").unwrap();
        }

        let to_owned =
            |rows: &[(&str, &str)]| -> Vec<(String, String)> {
                rows.iter().map(|(f, l)| (f.to_string(), l.to_string())).collect()
            };
        let sub_a = dir.join("a.csv");
        let sub_b = dir.join("b.csv");
        write_submission(&sub_a, &to_owned(rows_a)).unwrap();
        write_submission(&sub_b, &to_owned(rows_b)).unwrap();

        PseudoConfig {
            submissions: vec![
                sub_a.to_str().unwrap().to_string(),
                sub_b.to_str().unwrap().to_string(),
            ],
            test_dir: test_dir.to_str().unwrap().to_string(),
            out_dir:  dir.join("pseudo").to_str().unwrap().to_string(),
        }
    }

    #[test]
    fn copies_only_consensus_clips() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = setup(
            dir.path(),
            &[("c1.wav", "yes"), ("c2.wav", "no"), ("c3.wav", "up")],
            &[("c1.wav", "yes"), ("c2.wav", "go"), ("c3.wav", "up")],
        );
        let out = PathBuf::from(cfg.out_dir.clone());

        PseudoUseCase::new(cfg).execute().unwrap();

        assert!(out.join("yes/c1.wav").exists());
        assert!(out.join("up/c3.wav").exists());
        assert!(!out.join("no/c2.wav").exists());
        assert!(!out.join("go/c2.wav").exists());
    }

    #[test]
    fn mismatched_clip_order_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = setup(
            dir.path(),
            &[("c1.wav", "yes"), ("c2.wav", "no")],
            &[("c2.wav", "no"), ("c1.wav", "yes")],
        );
        let err = PseudoUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("order"), "{err}");
    }

    #[test]
    fn a_single_submission_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("only.csv");
        write_submission(&sub, &[("c1.wav".into(), "yes".into())]).unwrap();

        let cfg = PseudoConfig {
            submissions: vec![sub.to_str().unwrap().to_string()],
            test_dir:    dir.path().to_str().unwrap().to_string(),
            out_dir:     dir.path().join("out").to_str().unwrap().to_string(),
        };
        assert!(PseudoUseCase::new(cfg).execute().is_err());
    }
}
