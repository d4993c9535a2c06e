// ============================================================
// Layer 4 — WAV Decoding
// ============================================================
// Loads a .wav file into mono f32 samples in [-1.0, 1.0] using the
// hound crate. Integer formats are scaled by 2^(bits-1); multi-channel
// audio is downmixed by averaging.
//
// Clips are expected to be one second at the configured sample rate,
// but real recordings are sometimes short — `read_clip` zero-pads or
// truncates so every clip the pipeline sees has the same length.

use std::path::Path;

use anyhow::{Context, Result};

/// Decode a .wav file to mono f32 PCM in [-1.0, 1.0].
pub fn read(path: &Path) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Cannot open wav '{}'", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Corrupt float wav '{}'", path.display()))?,
        hound::SampleFormat::Int => {
            // Scale by the full range of the stored bit depth so a
            // full-scale i16 and a full-scale i24 decode identically.
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Corrupt int wav '{}'", path.display()))?
        }
    };

    if channels <= 1 {
        return Ok(samples);
    }

    // Downmix interleaved channels by averaging each frame.
    let mono = samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok(mono)
}

/// Decode a clip and force it to exactly `desired_samples` samples:
/// short clips are zero-padded at the end, long ones truncated.
pub fn read_clip(path: &Path, desired_samples: usize) -> Result<Vec<f32>> {
    let mut samples = read(path)?;
    samples.resize(desired_samples, 0.0);
    Ok(samples)
}
