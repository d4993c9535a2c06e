// ============================================================
// Layer 4 — MFCC Feature Extraction
// ============================================================
// Turns a fixed-length waveform into the 2-D "fingerprint" the
// convolutional models consume:
//
//   frame (30 ms, 10 ms hop)
//     → Hamming window → FFT → magnitude spectrum
//     → 40 triangular mel filters → log energies
//     → DCT-II, keeping coefficients 1..=13 (c0 / energy dropped)
//
// The window, the FFT plan, and the filter bank are precomputed in
// `new`; `fingerprint` only allocates its scratch and output buffers.
//
// Reference: rustfft documentation;
//            Davis & Mermelstein (1980), MFCC

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex32, FftPlanner};
use serde::{Deserialize, Serialize};

/// Everything that determines the fingerprint layout. Persisted with
/// the training config so inference recomputes identical features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Samples per second of the input audio
    pub sample_rate: usize,

    /// Clip length in milliseconds — shorter clips are zero-padded
    pub clip_duration_ms: usize,

    /// Analysis frame length in milliseconds
    pub window_size_ms: usize,

    /// Hop between adjacent frames in milliseconds
    pub window_stride_ms: usize,

    /// Number of triangular mel filters
    pub mel_bins: usize,

    /// Cepstral coefficients kept per frame (after dropping c0)
    pub coefficient_count: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            sample_rate:       16_000,
            clip_duration_ms:  1_000,
            window_size_ms:    30,
            window_stride_ms:  10,
            mel_bins:          40,
            coefficient_count: 13,
        }
    }
}

impl FeatureSettings {
    /// Samples per clip after padding/truncation.
    pub fn desired_samples(&self) -> usize {
        self.sample_rate * self.clip_duration_ms / 1_000
    }

    /// Samples per analysis frame.
    pub fn window_size_samples(&self) -> usize {
        self.sample_rate * self.window_size_ms / 1_000
    }

    /// Samples per hop.
    pub fn window_stride_samples(&self) -> usize {
        self.sample_rate * self.window_stride_ms / 1_000
    }

    /// Number of frames a full clip produces.
    pub fn frame_count(&self) -> usize {
        let desired = self.desired_samples();
        let window = self.window_size_samples();
        if desired < window {
            return 0;
        }
        1 + (desired - window) / self.window_stride_samples()
    }

    /// Total fingerprint length: frames × coefficients.
    pub fn fingerprint_size(&self) -> usize {
        self.frame_count() * self.coefficient_count
    }
}

/// MFCC extractor with precomputed window, FFT plan, and filter bank.
/// Shareable across threads — the DataLoader workers each call
/// `fingerprint` with their own scratch space.
pub struct FeatureExtractor {
    settings:    FeatureSettings,
    fft:         Arc<dyn rustfft::Fft<f32>>,
    hamming:     Vec<f32>,
    filter_bank: Vec<Vec<f32>>, // [mel_bin][mag_bin]
}

impl FeatureExtractor {
    pub fn new(settings: FeatureSettings) -> Self {
        let frame_size = settings.window_size_samples();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);

        let hamming = (0..frame_size)
            .map(|n| 0.54 - 0.46 * ((2.0 * PI * n as f32) / (frame_size - 1) as f32).cos())
            .collect();

        let mag_bins = frame_size / 2;
        let filter_bank = mel_filter_bank(settings.sample_rate, mag_bins, settings.mel_bins);

        Self { settings, fft, hamming, filter_bank }
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    /// Compute the full fingerprint for one clip.
    ///
    /// `samples` must be at least one frame long; the trailing partial
    /// frame, if any, is dropped. Output length is
    /// `frame_count(samples) * coefficient_count`.
    pub fn fingerprint(&self, samples: &[f32]) -> Vec<f32> {
        let frame_size = self.settings.window_size_samples();
        let stride = self.settings.window_stride_samples();
        let coeffs = self.settings.coefficient_count;

        let frame_count = if samples.len() >= frame_size {
            1 + (samples.len() - frame_size) / stride
        } else {
            0
        };

        let mag_bins = frame_size / 2;
        let mut fft_buf = vec![Complex32::ZERO; frame_size];
        let mut mags = vec![0f32; mag_bins];
        let mut out = Vec::with_capacity(frame_count * coeffs);

        for frame_idx in 0..frame_count {
            let start = frame_idx * stride;
            let frame = &samples[start..start + frame_size];

            // 1) Window + FFT
            for (dst, (&x, &w)) in fft_buf.iter_mut().zip(frame.iter().zip(&self.hamming)) {
                dst.re = x * w;
                dst.im = 0.0;
            }
            self.fft.process(&mut fft_buf);

            // 2) Magnitude spectrum
            for (i, m) in mags.iter_mut().enumerate() {
                let c = fft_buf[i];
                *m = (c.re * c.re + c.im * c.im).sqrt();
            }

            // 3) Mel filter bank → log energies
            let mut mel_energies = vec![0f32; self.settings.mel_bins];
            for (mel_bin, filt) in self.filter_bank.iter().enumerate() {
                let e = filt
                    .iter()
                    .zip(mags.iter())
                    .map(|(f, &m)| f * m)
                    .sum::<f32>()
                    + f32::MIN_POSITIVE;
                mel_energies[mel_bin] = e.ln();
            }

            // 4) DCT-II, skipping coefficient 0 (frame energy)
            let n = self.settings.mel_bins as f32;
            for k in 1..=coeffs {
                let mut s = 0.0;
                for (m, &e) in mel_energies.iter().enumerate() {
                    s += e * ((PI / n) * (m as f32 + 0.5) * k as f32).cos();
                }
                out.push(2.0 * s);
            }
        }

        out
    }
}

// ---------- helpers --------------------------------------------------------

/// Triangular mel filter bank over `mag_bins` magnitude bins.
fn mel_filter_bank(sample_rate: usize, mag_bins: usize, mel_bins: usize) -> Vec<Vec<f32>> {
    let f_max = sample_rate as f32 / 2.0;
    let mel_max = freq_to_mel(f_max);
    let mel_step = mel_max / (mel_bins + 1) as f32;
    let mut bank = vec![vec![0f32; mag_bins]; mel_bins];

    let center_freqs: Vec<f32> = (0..=mel_bins + 1)
        .map(|i| mel_to_freq(i as f32 * mel_step))
        .collect();

    for (i, filt) in bank.iter_mut().enumerate() {
        let f_left = center_freqs[i];
        let f_center = center_freqs[i + 1];
        let f_right = center_freqs[i + 2];

        for (bin, amp) in filt.iter_mut().enumerate() {
            // FFT bin spacing is sample_rate / frame_size = f_max / mag_bins.
            let freq = bin as f32 * f_max / mag_bins as f32;
            *amp = if freq < f_left || freq > f_right {
                0.0
            } else if freq <= f_center {
                (freq - f_left) / (f_center - f_left)
            } else {
                (f_right - freq) / (f_right - f_center)
            };
        }
    }
    bank
}

#[inline]
fn freq_to_mel(f: f32) -> f32 {
    1127.0 * (1.0 + f / 700.0).ln()
}

#[inline]
fn mel_to_freq(m: f32) -> f32 {
    700.0 * ((m / 1127.0).exp() - 1.0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_one_second_clip() {
        let s = FeatureSettings::default();
        assert_eq!(s.desired_samples(), 16_000);
        assert_eq!(s.window_size_samples(), 480);
        assert_eq!(s.window_stride_samples(), 160);
        assert_eq!(s.frame_count(), 98);
        assert_eq!(s.fingerprint_size(), 98 * 13);
    }

    #[test]
    fn fingerprint_has_exactly_frames_times_coeffs_values() {
        let extractor = FeatureExtractor::new(FeatureSettings::default());
        let clip = vec![0.1f32; 16_000];
        let fp = extractor.fingerprint(&clip);
        assert_eq!(fp.len(), 98 * 13);
        assert!(fp.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn silence_produces_finite_features() {
        // All-zero input must not produce NaN/-inf (log is floored).
        let extractor = FeatureExtractor::new(FeatureSettings::default());
        let fp = extractor.fingerprint(&vec![0.0f32; 16_000]);
        assert!(fp.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn short_input_yields_no_frames() {
        let extractor = FeatureExtractor::new(FeatureSettings::default());
        assert!(extractor.fingerprint(&[0.0; 100]).is_empty());
    }

    #[test]
    fn bins_map_to_fft_frequencies() {
        // 240 magnitude bins from a 480-sample frame at 16 kHz: spacing
        // is 16000/480 Hz, so the last bin sits just below Nyquist and
        // must still fall inside the topmost filter's triangle.
        let bank = mel_filter_bank(16_000, 240, 40);
        assert!(bank[39][239] > 0.0, "top filter misses the last bin");
    }

    #[test]
    fn mel_centers_are_monotonic() {
        let bank = mel_filter_bank(16_000, 240, 40);
        assert_eq!(bank.len(), 40);
        // Each filter's peak bin must move strictly upward.
        let peaks: Vec<usize> = bank
            .iter()
            .map(|filt| {
                filt.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                    .map(|(i, _)| i)
                    .unwrap()
            })
            .collect();
        for w in peaks.windows(2) {
            assert!(w[0] < w[1], "peaks not monotonic: {peaks:?}");
        }
    }
}
