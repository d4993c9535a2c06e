// ============================================================
// Layer 6 — Metrics Logger & Confusion Matrix
// ============================================================
// Records training metrics to a CSV file after each epoch, and
// accumulates the per-class confusion matrix during validation.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - lr:         the learning rate used for that epoch
//   - train_loss: average cross-entropy loss on training batches
//   - val_loss:   average cross-entropy loss on validation batches
//   - val_acc:    fraction of validation clips classified correctly
//
// Output file: <checkpoint_dir>/metrics.csv — appended across runs,
// so a restarted training session keeps one continuous record.
//
// The confusion matrix is the per-word diagnostic: loss can look
// fine while one word collapses entirely into "unknown", and only
// the matrix makes that visible.

use anyhow::Result;
use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Learning rate used for this epoch
    pub lr: f64,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,

    /// Fraction of validation clips classified correctly, [0.0, 1.0]
    pub val_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, lr: f64, train_loss: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, lr, train_loss, val_loss, val_acc }
    }

    /// True if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,lr,train_loss,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:e},{:.6},{:.6},{:.6}",
            m.epoch, m.lr, m.train_loss, m.val_loss, m.val_acc,
        )?;
        tracing::debug!(
            "Logged epoch {}: train_loss={:.4}, val_loss={:.4}, val_acc={:.4}",
            m.epoch, m.train_loss, m.val_loss, m.val_acc,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Confusion Matrix ─────────────────────────────────────────────────────────

/// Counts of (actual class, predicted class) pairs over one
/// validation pass. Rows are actual, columns are predicted.
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(labels: &[String]) -> Self {
        let n = labels.len();
        Self {
            labels: labels.to_vec(),
            counts: vec![vec![0; n]; n],
        }
    }

    /// Record one classified clip. Out-of-range indices can only come
    /// from a model head of the wrong size and are counted nowhere.
    pub fn record(&mut self, actual: usize, predicted: usize) {
        if actual < self.labels.len() && predicted < self.labels.len() {
            self.counts[actual][predicted] += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Correctly classified fraction (diagonal over total).
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.labels.len()).map(|i| self.counts[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Per-class recall: of clips that *are* this class, how many
    /// were predicted as it.
    pub fn recall(&self, class: usize) -> f64 {
        let row_total: usize = self.counts[class].iter().sum();
        if row_total == 0 {
            return 0.0;
        }
        self.counts[class][class] as f64 / row_total as f64
    }

    /// Render the matrix as an aligned table, actual classes down the
    /// side, predicted across the top (labels truncated to fit).
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let short = |l: &str| l.trim_matches('_').chars().take(5).collect::<String>();

        let _ = write!(out, "{:>12}", "");
        for label in &self.labels {
            let _ = write!(out, "{:>6}", short(label));
        }
        let _ = writeln!(out);

        for (i, row) in self.counts.iter().enumerate() {
            let _ = write!(out, "{:>12}", short(&self.labels[i]));
            for &count in row {
                let _ = write!(out, "{count:>6}");
            }
            let _ = writeln!(out, "  ({:.0}%)", self.recall(i) * 100.0);
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["_silence_".into(), "_unknown_".into(), "yes".into(), "no".into()]
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1e-3, 2.5, 2.3, 0.4);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn accuracy_is_diagonal_over_total() {
        let mut cm = ConfusionMatrix::new(&labels());
        cm.record(2, 2); // yes → yes
        cm.record(2, 2);
        cm.record(2, 3); // yes → no
        cm.record(0, 0); // silence → silence
        assert_eq!(cm.total(), 4);
        assert!((cm.accuracy() - 0.75).abs() < 1e-9);
        assert!((cm.recall(2) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_matrix_has_zero_accuracy() {
        let cm = ConfusionMatrix::new(&labels());
        assert_eq!(cm.accuracy(), 0.0);
    }

    #[test]
    fn table_mentions_every_label() {
        let mut cm = ConfusionMatrix::new(&labels());
        cm.record(3, 3);
        let table = cm.to_table();
        assert!(table.contains("yes"));
        assert!(table.contains("silen"));
    }

    #[test]
    fn logger_appends_rows_under_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1e-3, 2.5, 2.4, 0.3)).unwrap();
        logger.log(&EpochMetrics::new(2, 1e-3, 2.0, 1.9, 0.5)).unwrap();

        let contents = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,lr,train_loss,val_loss,val_acc");
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }
}
