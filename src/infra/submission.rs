// ============================================================
// Layer 6 — Submission CSV
// ============================================================
// The prediction output format: one `fname,label` row per test
// clip, preceded by a header. Written after inference and read
// back when mining pseudo-labels from earlier runs.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

pub const SUBMISSION_HEADER: &str = "fname,label";

/// Write prediction rows as a submission CSV.
/// Rows are written in the order given; callers keep them sorted
/// by file name so diffs between runs stay readable.
pub fn write_submission(path: &Path, rows: &[(String, String)]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut f = File::create(path)
        .with_context(|| format!("Cannot create submission file '{}'", path.display()))?;

    writeln!(f, "{SUBMISSION_HEADER}")?;
    for (fname, label) in rows {
        writeln!(f, "{fname},{label}")?;
    }

    tracing::info!("Wrote {} predictions to '{}'", rows.len(), path.display());
    Ok(())
}

/// Read a submission CSV back as (fname, label) pairs.
/// The header row is required; malformed rows are an error rather
/// than silently skipped, since a truncated file would otherwise
/// poison pseudo-label mining.
pub fn read_submission(path: &Path) -> Result<Vec<(String, String)>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Cannot read submission file '{}'", path.display()))?;

    let mut lines = contents.lines();
    match lines.next() {
        Some(header) if header.trim() == SUBMISSION_HEADER => {}
        _ => anyhow::bail!(
            "'{}' is not a submission file (missing '{}' header)",
            path.display(),
            SUBMISSION_HEADER,
        ),
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (fname, label) = line.split_once(',').with_context(|| {
            format!("Malformed row {} in '{}': '{}'", i + 2, path.display(), line)
        })?;
        rows.push((fname.trim().to_string(), label.trim().to_string()));
    }
    Ok(rows)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_rows_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");

        let rows = vec![
            ("clip_0001.wav".to_string(), "yes".to_string()),
            ("clip_0002.wav".to_string(), "unknown".to_string()),
            ("clip_0003.wav".to_string(), "silence".to_string()),
        ];
        write_submission(&path, &rows).unwrap();

        let loaded = read_submission(&path).unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/submission.csv");
        write_submission(&path, &[("a.wav".into(), "go".into())]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_files_without_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.csv");
        fs::write(&path, "clip.wav,yes\n").unwrap();

        let err = read_submission(&path).unwrap_err();
        assert!(err.to_string().contains("header"), "{err}");
    }

    #[test]
    fn rejects_rows_without_a_comma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "fname,label\nclip.wav yes\n").unwrap();

        let err = read_submission(&path).unwrap_err();
        assert!(err.to_string().contains("Malformed"), "{err}");
    }

    #[test]
    fn skips_trailing_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.csv");
        fs::write(&path, "fname,label\nclip.wav,up\n\n").unwrap();

        let rows = read_submission(&path).unwrap();
        assert_eq!(rows, vec![("clip.wav".to_string(), "up".to_string())]);
    }
}
