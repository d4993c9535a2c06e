// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// The fixed, ordered list of class labels the classifier can emit.
//
// Two pseudo-labels are always prepended to the word list:
//   index 0: "_silence_" — no speech in the clip
//   index 1: "_unknown_" — speech, but not one of the listed words
//
// Every spoken word the scanner encounters maps to exactly one
// index: listed words map to their own slot, everything else
// collapses onto the unknown slot. The mapping is built once at
// startup and never changes — model outputs are only meaningful
// relative to this ordering.

use std::collections::HashMap;

/// Label for clips that contain no speech. Always index 0.
pub const SILENCE_LABEL: &str = "_silence_";
pub const SILENCE_INDEX: usize = 0;

/// Label for words outside the vocabulary. Always index 1.
pub const UNKNOWN_LABEL: &str = "_unknown_";
pub const UNKNOWN_INDEX: usize = 1;

/// The ten command words that are actually scored. Everything else
/// is folded into "unknown" when writing a submission.
pub const WANTED_WORDS: [&str; 10] = [
    "yes", "no", "up", "down", "left", "right", "on", "off", "stop", "go",
];

/// All thirty words present in the recorded dataset. Training on the
/// full set gives the model a chance to tell the unwanted words apart
/// instead of lumping them into one diffuse class.
pub const ALL_WORDS: [&str; 30] = [
    "bed", "bird", "cat", "dog", "down", "eight", "five", "four", "go",
    "happy", "house", "left", "marvin", "nine", "no", "off", "on", "one",
    "right", "seven", "sheila", "six", "stop", "three", "tree", "two",
    "up", "wow", "yes", "zero",
];

/// The ordered label list plus the index lookup built from it.
/// Index ↔ label is a bijection over `words` for the lifetime
/// of the process.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Ordered labels: [_silence_, _unknown_, w1, w2, ...]
    words: Vec<String>,

    /// word → index over the same list
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from a custom word list.
    /// The silence and unknown pseudo-labels are prepended automatically.
    pub fn new(wanted: &[&str]) -> Self {
        let mut words = vec![SILENCE_LABEL.to_string(), UNKNOWN_LABEL.to_string()];
        words.extend(wanted.iter().map(|w| w.to_string()));

        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        Self { words, index }
    }

    /// Vocabulary over the ten scored command words only.
    pub fn wanted() -> Self {
        Self::new(&WANTED_WORDS)
    }

    /// Vocabulary over all thirty recorded words.
    pub fn full() -> Self {
        Self::new(&ALL_WORDS)
    }

    /// Number of classes, including the two pseudo-labels.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The label at a class index. Panics on out-of-range input,
    /// which can only come from a model with the wrong head size.
    pub fn label(&self, index: usize) -> &str {
        &self.words[index]
    }

    /// The class index for a word. Words that are not listed map to
    /// the unknown slot — this is how out-of-vocabulary training
    /// folders become "unknown" training material.
    pub fn index_of(&self, word: &str) -> usize {
        self.index.get(word).copied().unwrap_or(UNKNOWN_INDEX)
    }

    /// True if the word has its own slot (including the pseudo-labels).
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Ordered view of all labels, e.g. for confusion matrix headers.
    pub fn labels(&self) -> &[String] {
        &self.words
    }

    /// Map a predicted class index to the label written in a
    /// submission row: scored words keep their name, silence becomes
    /// "silence", everything else becomes "unknown".
    pub fn submission_word(&self, index: usize) -> String {
        let label = self.label(index);
        if label == SILENCE_LABEL {
            return "silence".to_string();
        }
        if WANTED_WORDS.contains(&label) {
            return label.to_string();
        }
        "unknown".to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_labels_come_first() {
        let vocab = Vocabulary::wanted();
        assert_eq!(vocab.label(SILENCE_INDEX), SILENCE_LABEL);
        assert_eq!(vocab.label(UNKNOWN_INDEX), UNKNOWN_LABEL);
        assert_eq!(vocab.len(), 12);
        assert_eq!(Vocabulary::full().len(), 32);
    }

    #[test]
    fn index_label_roundtrip_is_a_bijection() {
        let vocab = Vocabulary::full();
        for i in 0..vocab.len() {
            assert_eq!(vocab.index_of(vocab.label(i)), i);
        }
    }

    #[test]
    fn unlisted_words_map_to_unknown() {
        let vocab = Vocabulary::wanted();
        assert_eq!(vocab.index_of("marvin"), UNKNOWN_INDEX);
        assert_eq!(vocab.index_of("definitely_not_a_word"), UNKNOWN_INDEX);
        assert!(!vocab.contains("marvin"));
        assert!(vocab.contains("yes"));
    }

    #[test]
    fn submission_mapping_collapses_unwanted_words() {
        let vocab = Vocabulary::full();
        assert_eq!(vocab.submission_word(SILENCE_INDEX), "silence");
        assert_eq!(vocab.submission_word(UNKNOWN_INDEX), "unknown");
        assert_eq!(vocab.submission_word(vocab.index_of("yes")), "yes");
        // "marvin" is recorded but not scored — folds into unknown
        assert_eq!(vocab.submission_word(vocab.index_of("marvin")), "unknown");
    }
}
