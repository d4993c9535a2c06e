use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One discovered audio clip and its ground-truth label.
///
/// The label is the word string (or a pseudo-label like "_silence_"),
/// not a class index — index resolution happens against the
/// `Vocabulary` at batch time, so the same record list works for any
/// vocabulary choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Path to the .wav file on disk
    pub path: PathBuf,

    /// Word label, taken from the clip's parent directory name
    pub label: String,
}

impl SampleRecord {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path:  path.into(),
            label: label.into(),
        }
    }

    /// The bare filename, as written into submission rows.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}
