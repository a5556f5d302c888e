//! Adaptive energy-based Voice Activity Detection (VAD).
//!
//! [`VadDetector`] labels each [`WaveformFrame`] voiced or unvoiced.
//!
//! ## Algorithm
//!
//! 1. Frame energies are measured in dBFS (floored at −120 dB).
//! 2. The noise floor is the configured percentile of those energies and the
//!    peak is their maximum.
//! 3. The threshold is `noise_floor + margin`, lowered to `peak − margin`
//!    when the recording has little dynamic range, but never below the
//!    absolute floor.  Fixed thresholds break on quiet microphones; this one
//!    follows the recording.
//! 4. Frames above the threshold are voiced.  Hangover: an unvoiced run
//!    shorter than `hangover_frames` that sits between two voiced frames is
//!    relabelled voiced, so short dips inside words do not split speech.

use crate::config::VadConfig;

use super::frame::WaveformFrame;

// ---------------------------------------------------------------------------
// VadDecision
// ---------------------------------------------------------------------------

/// Per-frame voicing plus the levels that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct VadDecision {
    pub voiced: Vec<bool>,
    pub threshold_db: f64,
    pub noise_floor_db: f64,
    pub peak_db: f64,
}

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Adaptive-threshold frame classifier.
///
/// ```rust
/// use speech_analytics::audio::{VadDetector, WaveformFrame};
/// use speech_analytics::config::VadConfig;
///
/// let frames: Vec<WaveformFrame> = (0..30)
///     .map(|i| {
///         let level = if (10..20).contains(&i) { 0.3 } else { 0.0 };
///         WaveformFrame::new(i, i as f64 * 0.01, vec![level; 400])
///     })
///     .collect();
///
/// let decision = VadDetector::new(VadConfig::default()).classify(&frames);
/// assert_eq!(decision.voiced.iter().filter(|v| **v).count(), 10);
/// ```
pub struct VadDetector {
    config: VadConfig,
}

impl VadDetector {
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    /// Threshold in dBFS for a set of frame energies.
    ///
    /// Returns `(threshold, noise_floor, peak)`.
    pub fn adaptive_threshold(&self, energies_db: &[f64]) -> (f64, f64, f64) {
        let floor = self.config.absolute_floor_db;
        if energies_db.is_empty() {
            return (floor, floor, floor);
        }

        let mut sorted = energies_db.to_vec();
        sorted.sort_by(f64::total_cmp);

        let p = self.config.noise_floor_percentile.clamp(0.0, 1.0);
        let rank = (p * (sorted.len() - 1) as f64).floor() as usize;
        let noise_floor = sorted[rank];
        let peak = sorted[sorted.len() - 1];

        let margin = self.config.margin_db;
        let threshold = (noise_floor + margin).min(peak - margin).max(floor);
        (threshold, noise_floor, peak)
    }

    /// Classify every frame.
    pub fn classify(&self, frames: &[WaveformFrame]) -> VadDecision {
        let energies: Vec<f64> = frames.iter().map(WaveformFrame::dbfs).collect();
        let (threshold_db, noise_floor_db, peak_db) = self.adaptive_threshold(&energies);

        let mut voiced: Vec<bool> = energies.iter().map(|&e| e > threshold_db).collect();
        bridge_short_gaps(&mut voiced, self.config.hangover_frames);

        log::debug!(
            "vad: {} frames, noise floor {noise_floor_db:.1} dB, peak {peak_db:.1} dB, \
             threshold {threshold_db:.1} dB, {} voiced",
            frames.len(),
            voiced.iter().filter(|v| **v).count()
        );

        VadDecision {
            voiced,
            threshold_db,
            noise_floor_db,
            peak_db,
        }
    }
}

/// Relabel interior unvoiced runs shorter than `hangover` frames as voiced.
fn bridge_short_gaps(voiced: &mut [bool], hangover: usize) {
    let mut last_voiced: Option<usize> = None;
    for i in 0..voiced.len() {
        if !voiced[i] {
            continue;
        }
        if let Some(prev) = last_voiced {
            let gap = i - prev - 1;
            if gap > 0 && gap < hangover {
                voiced[prev + 1..i].iter_mut().for_each(|v| *v = true);
            }
        }
        last_voiced = Some(i);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn frames_from_levels(levels: &[f32]) -> Vec<WaveformFrame> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &l)| WaveformFrame::new(i, i as f64 * 0.01, vec![l; 400]))
            .collect()
    }

    fn detector() -> VadDetector {
        VadDetector::new(VadConfig::default())
    }

    #[test]
    fn loud_frames_are_voiced_silence_is_not() {
        let mut levels = vec![0.0; 20];
        levels.extend(vec![0.2; 20]);
        levels.extend(vec![0.0; 20]);
        let d = detector().classify(&frames_from_levels(&levels));
        assert!(d.voiced[..20].iter().all(|v| !v));
        assert!(d.voiced[20..40].iter().all(|v| *v));
        assert!(d.voiced[40..].iter().all(|v| !v));
    }

    #[test]
    fn threshold_adapts_to_quiet_recordings() {
        // Whole recording ~30 dB quieter than the loud case; speech still found.
        let mut levels = vec![0.0005; 30];
        levels.extend(vec![0.01; 30]);
        let d = detector().classify(&frames_from_levels(&levels));
        assert!(d.voiced[30..].iter().all(|v| *v));
        assert!(d.voiced[..30].iter().all(|v| !v));
    }

    #[test]
    fn all_silent_recording_has_no_voice() {
        let d = detector().classify(&frames_from_levels(&[0.0; 50]));
        assert!(d.voiced.iter().all(|v| !v));
        assert_eq!(d.threshold_db, VadConfig::default().absolute_floor_db);
    }

    #[test]
    fn short_dips_are_bridged_long_ones_are_not() {
        let mut levels = vec![0.2; 10];
        levels.extend(vec![0.0; 3]); // shorter than hangover → bridged
        levels.extend(vec![0.2; 10]);
        levels.extend(vec![0.0; 30]); // real pause
        levels.extend(vec![0.2; 10]);
        let d = detector().classify(&frames_from_levels(&levels));
        assert!(d.voiced[..23].iter().all(|v| *v));
        assert!(d.voiced[23..53].iter().all(|v| !v));
        assert!(d.voiced[53..].iter().all(|v| *v));
    }

    #[test]
    fn edges_are_never_bridged() {
        let mut levels = vec![0.0; 3];
        levels.extend(vec![0.2; 10]);
        levels.extend(vec![0.0; 3]);
        let d = detector().classify(&frames_from_levels(&levels));
        assert!(!d.voiced[0] && !d.voiced[15]);
    }

    #[test]
    fn threshold_formula() {
        let (t, floor, peak) = detector().adaptive_threshold(&[-80.0, -80.0, -20.0]);
        assert_eq!(floor, -80.0);
        assert_eq!(peak, -20.0);
        assert_eq!(t, -60.0); // max(-60, min(-70, -30))
    }
}
