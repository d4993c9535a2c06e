// ============================================================
// Layer 4 — Waveform Augmentation
// ============================================================
// Training-time distortions, applied to the raw waveform before
// feature extraction so every epoch sees a slightly different view
// of the same clip:
//
//   1. foreground volume — jittered, flipped, or muted (silence)
//   2. time shift        — roll the clip, zero-filling the gap
//   3. background mix    — add a random window of recorded noise
//   4. clamp             — keep the result inside [-1.0, 1.0]
//
// Validation and testing use `AugmentSettings::disabled()` so the
// metrics stay comparable between epochs.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probabilities and ranges for each distortion. All frequencies are
/// in [0.0, 1.0]; a frequency of zero disables that distortion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentSettings {
    /// Share of clips that get background noise mixed in
    pub background_frequency: f64,

    /// Noise volume is drawn uniformly from [0, this]
    pub background_volume_range: f64,

    /// Share of clips whose foreground volume is jittered
    pub foreground_frequency: f64,

    /// Volume jitter range: 1.0 ± this
    pub foreground_volume_range: f64,

    /// Share of clips whose waveform sign is flipped
    pub flip_frequency: f64,

    /// Share of clips that are shifted in time
    pub time_shift_frequency: f64,

    /// Maximum shift in samples, both directions
    pub time_shift_samples: usize,
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            background_frequency:    0.5,
            background_volume_range: 0.2,
            foreground_frequency:    0.5,
            foreground_volume_range: 0.2,
            flip_frequency:          0.0,
            time_shift_frequency:    0.5,
            time_shift_samples:      1_600, // 100 ms at 16 kHz
        }
    }
}

impl AugmentSettings {
    /// All distortions off — used for validation and testing passes.
    pub fn disabled() -> Self {
        Self {
            background_frequency:    0.0,
            background_volume_range: 0.0,
            foreground_frequency:    0.0,
            foreground_volume_range: 0.0,
            flip_frequency:          0.0,
            time_shift_frequency:    0.0,
            time_shift_samples:      0,
        }
    }
}

/// Scale every sample by `volume`. Volume 0.0 mutes the clip, which
/// is how silence samples are produced from an arbitrary wav.
pub fn scale(samples: &mut [f32], volume: f32) {
    for s in samples.iter_mut() {
        *s *= volume;
    }
}

/// Roll the waveform by `shift` samples, filling the gap with zeros.
/// Positive shifts delay the clip (content moves right), negative
/// shifts advance it. Length is preserved.
pub fn time_shift(samples: &mut [f32], shift: isize) {
    let len = samples.len();
    if shift == 0 || len == 0 {
        return;
    }
    let amount = shift.unsigned_abs().min(len);
    if shift > 0 {
        samples.copy_within(0..len - amount, amount);
        samples[..amount].fill(0.0);
    } else {
        samples.copy_within(amount.., 0);
        samples[len - amount..].fill(0.0);
    }
}

/// Mix `volume`-scaled noise into the clip, then clamp to [-1, 1].
/// The noise slice must be at least as long as the clip.
pub fn mix_background(samples: &mut [f32], noise: &[f32], volume: f32) {
    for (s, &n) in samples.iter_mut().zip(noise) {
        *s = (*s + n * volume).clamp(-1.0, 1.0);
    }
}

/// Apply the full distortion chain to one clip.
///
/// `is_silence` mutes the foreground entirely (the background, if
/// any, still gets mixed in — silence clips are just noise).
pub fn distort<R: Rng>(
    rng:        &mut R,
    settings:   &AugmentSettings,
    samples:    &mut [f32],
    is_silence: bool,
    background: &[Vec<f32>],
) {
    // ── Foreground volume ─────────────────────────────────────────────────
    if is_silence {
        scale(samples, 0.0);
    } else {
        let mut volume = 1.0f32;
        if settings.foreground_frequency > 0.0
            && rng.gen_range(0.0..1.0) < settings.foreground_frequency
        {
            let range = settings.foreground_volume_range as f32;
            volume = 1.0 + rng.gen_range(-range..=range);
        }
        if settings.flip_frequency > 0.0 && rng.gen_range(0.0..1.0) < settings.flip_frequency {
            volume = -volume;
        }
        if (volume - 1.0).abs() > f32::EPSILON {
            scale(samples, volume);
        }
    }

    // ── Time shift ────────────────────────────────────────────────────────
    if settings.time_shift_frequency > 0.0
        && settings.time_shift_samples > 0
        && rng.gen_range(0.0..1.0) < settings.time_shift_frequency
    {
        let max = settings.time_shift_samples as isize;
        let shift = rng.gen_range(-max..=max);
        time_shift(samples, shift);
    }

    // ── Background noise ──────────────────────────────────────────────────
    if !background.is_empty()
        && settings.background_frequency > 0.0
        && settings.background_volume_range > 0.0
        && rng.gen_range(0.0..1.0) < settings.background_frequency
    {
        let clip = &background[rng.gen_range(0..background.len())];
        if clip.len() >= samples.len() {
            let offset = rng.gen_range(0..=clip.len() - samples.len());
            let volume = rng.gen_range(0.0..settings.background_volume_range) as f32;
            mix_background(samples, &clip[offset..offset + samples.len()], volume);
        }
    }

    // Mixing already clamps; an extreme foreground volume alone can
    // still push past full scale.
    for s in samples.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn time_shift_right_zero_fills_the_front() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        time_shift(&mut v, 2);
        assert_eq!(v, vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn time_shift_left_zero_fills_the_back() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        time_shift(&mut v, -1);
        assert_eq!(v, vec![2.0, 3.0, 4.0, 0.0]);
    }

    #[test]
    fn time_shift_preserves_length_at_extremes() {
        let mut v = vec![1.0; 8];
        time_shift(&mut v, 100);
        assert_eq!(v, vec![0.0; 8]);
        let mut v = vec![1.0; 8];
        time_shift(&mut v, -100);
        assert_eq!(v, vec![0.0; 8]);
    }

    #[test]
    fn mixing_clamps_to_unit_range() {
        let mut v = vec![0.9, -0.9];
        mix_background(&mut v, &[1.0, -1.0], 0.5);
        assert_eq!(v, vec![1.0, -1.0]);
    }

    #[test]
    fn silence_clips_are_muted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut v = vec![0.5f32; 100];
        // No background available → the output must be all zeros.
        distort(&mut rng, &AugmentSettings::default(), &mut v, true, &[]);
        assert!(v.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn disabled_settings_leave_the_clip_untouched() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut v = vec![0.25f32; 64];
        let noise = vec![vec![1.0f32; 256]];
        distort(&mut rng, &AugmentSettings::disabled(), &mut v, false, &noise);
        assert_eq!(v, vec![0.25f32; 64]);
    }
}
