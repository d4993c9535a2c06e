// ============================================================
// Layer 3 — Partition Assignment
// ============================================================
// Decides whether a clip belongs to training, validation, or
// testing — stably, from nothing but its filename.
//
// Why hash the name instead of rolling a die?
//   Files get added to the dataset over time. A hash of the name
//   keeps every existing file in the same set across re-runs and
//   restarts, so validation clips never silently leak into
//   training after the corpus grows.
//
// Speakers record several variations of the same word. Everything
// after "_nohash_" in a filename is ignored for set assignment, so
// "bobby_nohash_0.wav" and "bobby_nohash_1.wav" always land in the
// same set — one person's voice never straddles the split.
//
// Filenames *without* a "_nohash_" marker are externally labelled
// test clips (pseudo-labels); they form their own partition and are
// only mixed into training on request.

use std::path::Path;

use sha1::{Digest, Sha1};

/// Upper bound on files per class; the hash is reduced modulo this
/// (plus one) before being scaled to a percentage.
const MAX_WAVS_PER_CLASS: u32 = (1 << 27) - 1;

/// Folder whose clips are always treated as training material,
/// regardless of their filenames.
const UNKNOWN_UNKNOWN_DIR: &str = "unknown_unknown";

/// Which split a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Training,
    Validation,
    Testing,
    /// Externally labelled clips without a `_nohash_` marker.
    Pseudo,
}

impl Partition {
    /// Assign a wav file to a partition from its path alone.
    ///
    /// `validation_percentage` and `testing_percentage` carve out the
    /// respective shares; everything else is training. The result is
    /// deterministic: the same path with the same percentages always
    /// yields the same partition.
    pub fn of(path: &Path, validation_percentage: f64, testing_percentage: f64) -> Self {
        // Pseudo-label folders are pinned to training wholesale.
        let dir_name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");
        if dir_name == UNKNOWN_UNKNOWN_DIR {
            return Partition::Training;
        }

        let base_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");

        // No grouping marker → externally labelled clip.
        let stem = match base_name.find("_nohash_") {
            Some(pos) => &base_name[..pos],
            None => return Partition::Pseudo,
        };

        let percentage = percentage_hash(stem);
        if percentage < validation_percentage {
            Partition::Validation
        } else if percentage < validation_percentage + testing_percentage {
            Partition::Testing
        } else {
            Partition::Training
        }
    }
}

/// Map a name to a stable value in [0, 100].
///
/// SHA-1 of the name, taken modulo 2^27 and scaled. The modulus only
/// depends on the low 27 bits of the digest, i.e. its last four bytes.
fn percentage_hash(stem: &str) -> f64 {
    let digest = Sha1::digest(stem.as_bytes());
    let tail = u32::from_be_bytes([digest[16], digest[17], digest[18], digest[19]]);
    let bucket = tail & MAX_WAVS_PER_CLASS;
    bucket as f64 * (100.0 / MAX_WAVS_PER_CLASS as f64)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn wav(dir: &str, name: &str) -> PathBuf {
        PathBuf::from(format!("data/train/audio/{dir}/{name}"))
    }

    #[test]
    fn assignment_is_deterministic() {
        let p = wav("yes", "ab0fe215_nohash_0.wav");
        let first = Partition::of(&p, 10.0, 10.0);
        for _ in 0..10 {
            assert_eq!(Partition::of(&p, 10.0, 10.0), first);
        }
    }

    #[test]
    fn nohash_variants_share_a_partition() {
        // Same speaker prefix, different take → must agree.
        for i in 0..5 {
            let a = wav("yes", &format!("bobby_nohash_{i}.wav"));
            let b = wav("no", "bobby_nohash_99.wav");
            assert_eq!(
                Partition::of(&a, 25.0, 25.0),
                Partition::of(&b, 25.0, 25.0),
            );
        }
    }

    #[test]
    fn zero_percentages_always_train() {
        for i in 0..50 {
            let p = wav("left", &format!("speaker{i}_nohash_0.wav"));
            assert_eq!(Partition::of(&p, 0.0, 0.0), Partition::Training);
        }
    }

    #[test]
    fn missing_marker_is_pseudo() {
        let p = wav("go", "clip_0001.wav");
        assert_eq!(Partition::of(&p, 10.0, 10.0), Partition::Pseudo);
    }

    #[test]
    fn unknown_unknown_dir_is_pinned_to_training() {
        // Even without a _nohash_ marker.
        let p = wav("unknown_unknown", "clip_0001.wav");
        assert_eq!(Partition::of(&p, 50.0, 50.0), Partition::Training);
    }

    #[test]
    fn shares_are_roughly_proportional() {
        // 200 hashed names with a 50% validation share: the count must
        // land near 100. The bound is loose on purpose — this guards
        // against scaling bugs, not statistical drift.
        let hits = (0..200)
            .filter(|i| {
                let p = wav("on", &format!("user{i:04}_nohash_0.wav"));
                Partition::of(&p, 50.0, 0.0) == Partition::Validation
            })
            .count();
        assert!((50..=150).contains(&hits), "got {hits} validation hits");
    }
}
