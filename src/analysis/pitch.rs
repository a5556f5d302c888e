//! Fundamental-frequency (F0) estimation by normalised autocorrelation.
//!
//! For each candidate lag τ in the search range the normalised
//! autocorrelation is
//!
//! ```text
//! r(τ) = Σ x[i]·x[i+τ] / sqrt(Σ x[i]² · Σ x[i+τ]²)
//! ```
//!
//! The frame is voiced when the strongest peak clears the voicing threshold.
//! To avoid octave errors the *first* local peak within 90 % of the strongest
//! one is taken rather than the global maximum, and its position is refined
//! with a parabola through the neighbouring lags.

use crate::config::PitchBands;

/// A peak must reach this fraction of the strongest one to be chosen.
const OCTAVE_GUARD_RATIO: f64 = 0.9;
const MIN_ENERGY: f64 = 1e-10;

pub struct PitchTracker {
    sample_rate: f64,
    min_hz: f64,
    max_hz: f64,
    min_lag: usize,
    max_lag: usize,
    voicing_threshold: f64,
}

impl PitchTracker {
    pub fn new(sample_rate: u32, bands: &PitchBands) -> Self {
        let sr = sample_rate as f64;
        Self {
            sample_rate: sr,
            min_hz: bands.min_hz,
            max_hz: bands.max_hz,
            min_lag: ((sr / bands.max_hz).floor() as usize).max(2),
            max_lag: (sr / bands.min_hz).ceil() as usize,
            voicing_threshold: bands.voicing_threshold,
        }
    }

    /// Estimated F0 in Hz, or `None` for unvoiced / too-short frames.
    pub fn estimate(&self, samples: &[f32]) -> Option<f64> {
        let n = samples.len();
        // Parabolic refinement needs one lag on each side of the search range.
        let max_lag = self.max_lag.min(n.saturating_sub(2));
        if self.min_lag + 1 > max_lag {
            return None;
        }

        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n as f64;
        let x: Vec<f64> = samples.iter().map(|&s| s as f64 - mean).collect();

        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        for v in &x {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + v * v);
        }
        if prefix[n] <= MIN_ENERGY {
            return None;
        }

        // nacf[k] holds r(min_lag - 1 + k).
        let first = self.min_lag - 1;
        let nacf: Vec<f64> = (first..=max_lag + 1)
            .map(|lag| {
                let r: f64 = (0..n - lag).map(|i| x[i] * x[i + lag]).sum();
                let e1 = prefix[n - lag];
                let e2 = prefix[n] - prefix[lag];
                let norm = (e1 * e2).sqrt();
                if norm <= MIN_ENERGY {
                    0.0
                } else {
                    r / norm
                }
            })
            .collect();
        let at = |lag: usize| nacf[lag - first];

        let strongest = (self.min_lag..=max_lag)
            .map(at)
            .fold(f64::NEG_INFINITY, f64::max);
        if strongest < self.voicing_threshold {
            return None;
        }

        let lag = (self.min_lag..=max_lag).find(|&l| {
            let v = at(l);
            v >= OCTAVE_GUARD_RATIO * strongest && v >= at(l - 1) && v >= at(l + 1)
        })?;

        let (a, b, c) = (at(lag - 1), at(lag), at(lag + 1));
        let denom = a - 2.0 * b + c;
        let offset = if denom.abs() > f64::EPSILON {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        let f0 = self.sample_rate / (lag as f64 + offset);
        Some(f0.clamp(self.min_hz, self.max_hz))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn tracker() -> PitchTracker {
        PitchTracker::new(RATE, &PitchBands::default())
    }

    fn sine(freq: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (0.4 * (2.0 * std::f64::consts::PI * freq * i as f64 / RATE as f64).sin()) as f32)
            .collect()
    }

    /// Pulse-like voiced signal: fundamental plus two decaying harmonics.
    fn voiced(freq: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * freq * i as f64 / RATE as f64;
                (0.3 * t.sin() + 0.2 * (2.0 * t).sin() + 0.1 * (3.0 * t).sin()) as f32
            })
            .collect()
    }

    #[test]
    fn pure_tones_are_tracked() {
        for freq in [110.0, 150.0, 220.0, 330.0] {
            let f0 = tracker().estimate(&sine(freq, 400)).unwrap();
            assert!((f0 - freq).abs() < 2.0, "{freq} Hz estimated as {f0}");
        }
    }

    #[test]
    fn harmonics_do_not_cause_octave_errors() {
        let f0 = tracker().estimate(&voiced(120.0, 400)).unwrap();
        assert!((f0 - 120.0).abs() < 2.0, "estimated {f0}");
    }

    #[test]
    fn silence_has_no_pitch() {
        assert_eq!(tracker().estimate(&[0.0; 400]), None);
    }

    #[test]
    fn noise_has_no_pitch() {
        let mut state: u32 = 12_345;
        let noise: Vec<f32> = (0..400)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 16) as f32 / 32_768.0) - 1.0
            })
            .collect();
        assert_eq!(tracker().estimate(&noise), None);
    }

    #[test]
    fn frames_shorter_than_search_range_are_skipped() {
        assert_eq!(tracker().estimate(&sine(150.0, 30)), None);
    }
}
