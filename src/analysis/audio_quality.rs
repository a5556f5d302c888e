//! Volume, pitch variation and clarity (SNR) of the voiced portion of a
//! recording.
//!
//! Only frames the VAD marked as voiced contribute to volume and pitch;
//! clarity compares voiced against unvoiced frame power.  A recording with no
//! voiced frame still yields a report, with placeholder figures and
//! `clarity.quality == poor`.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::audio::{power_to_db, VoiceActivityTimeline, WaveformFrame, MIN_DBFS};
use crate::config::{AudioQualityConfig, ClarityBands, PitchBands, VolumeBands};

use super::pitch::PitchTracker;

/// Pitch estimates between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 64;

// ---------------------------------------------------------------------------
// Quality buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeQuality {
    TooQuiet,
    Quiet,
    Optimal,
    Loud,
    TooLoud,
}

impl VolumeQuality {
    pub fn from_dbfs(db: f64, bands: &VolumeBands) -> Self {
        if db < bands.too_quiet_below {
            Self::TooQuiet
        } else if db < bands.quiet_below {
            Self::Quiet
        } else if db <= bands.loud_above {
            Self::Optimal
        } else if db <= bands.too_loud_above {
            Self::Loud
        } else {
            Self::TooLoud
        }
    }

    fn advice(self) -> Option<&'static str> {
        match self {
            Self::TooQuiet => Some(
                "Your voice is very quiet. Move closer to the microphone or raise your input gain.",
            ),
            Self::Quiet => Some("Your voice is a little quiet. Project a bit more."),
            Self::Optimal => None,
            Self::Loud => Some("Your voice is a little loud. Ease off slightly or step back from the microphone."),
            Self::TooLoud => Some(
                "Your voice is very loud. Lower the input gain to avoid distortion.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PitchQuality {
    Monotone,
    LowVariation,
    Optimal,
    HighVariation,
}

impl PitchQuality {
    pub fn from_std_dev(std_dev_hz: f64, bands: &PitchBands) -> Self {
        if std_dev_hz < bands.monotone_below_hz {
            Self::Monotone
        } else if std_dev_hz < bands.low_variation_below_hz {
            Self::LowVariation
        } else if std_dev_hz <= bands.high_variation_above_hz {
            Self::Optimal
        } else {
            Self::HighVariation
        }
    }

    fn advice(self) -> Option<&'static str> {
        match self {
            Self::Monotone => Some(
                "Your delivery sounds monotone. Vary your pitch to stress key words.",
            ),
            Self::LowVariation => Some("Add a little more pitch variation to sound more engaged."),
            Self::Optimal => None,
            Self::HighVariation => Some(
                "Your pitch swings widely. Aim for steadier intonation.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClarityQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ClarityQuality {
    pub fn from_snr(snr_db: f64, bands: &ClarityBands) -> Self {
        if snr_db >= bands.excellent_min_db {
            Self::Excellent
        } else if snr_db >= bands.good_min_db {
            Self::Good
        } else if snr_db >= bands.fair_min_db {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    fn advice(self) -> Option<&'static str> {
        match self {
            Self::Poor => Some(
                "Background noise is masking your voice. Record in a quieter room or use a \
                 closer microphone.",
            ),
            Self::Fair => Some("Some background noise is audible. Reduce it if you can."),
            Self::Good | Self::Excellent => None,
        }
    }
}

const CLIPPING_ADVICE: &str =
    "Parts of the recording are clipped. Lower the input gain and keep a steady distance \
     from the microphone.";
const NO_VOICE_ADVICE: &str =
    "No voiced audio was detected. Check that the microphone is connected and not muted.";
const GOOD_AUDIO_ADVICE: &str = "Your audio is clear and well balanced.";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMetrics {
    pub average_db: f64,
    pub min_db: f64,
    pub max_db: f64,
    /// 0–100; 100 means perfectly even loudness.
    pub consistency: f64,
    pub quality: VolumeQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchMetrics {
    pub average_hz: f64,
    pub min_hz: f64,
    pub max_hz: f64,
    pub std_dev_hz: f64,
    pub monotone: bool,
    /// Frames that produced an F0 estimate.
    pub tracked_frames: usize,
    pub quality: PitchQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarityMetrics {
    pub snr_db: f64,
    pub noise_floor_db: f64,
    pub signal_level_db: f64,
    pub quality: ClarityQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioQualityMetrics {
    pub volume: VolumeMetrics,
    pub pitch: PitchMetrics,
    pub clarity: ClarityMetrics,
    /// Fraction (0–1) of input samples at or above the clipping threshold.
    pub clipping_ratio: f64,
    pub recommendation: String,
    /// Set when there was no voiced audio to measure.
    pub degraded: bool,
}

// ---------------------------------------------------------------------------
// AudioQualityAnalyzer
// ---------------------------------------------------------------------------

pub struct AudioQualityAnalyzer {
    config: AudioQualityConfig,
    pitch: PitchTracker,
}

impl AudioQualityAnalyzer {
    pub fn new(config: AudioQualityConfig, sample_rate: u32) -> Self {
        let pitch = PitchTracker::new(sample_rate, &config.pitch);
        Self { config, pitch }
    }

    pub fn analyze(
        &self,
        frames: &[WaveformFrame],
        timeline: &VoiceActivityTimeline,
        clipping_ratio: f64,
    ) -> AudioQualityMetrics {
        match self.analyze_cancellable(frames, timeline, clipping_ratio, &CancellationToken::new()) {
            Some(metrics) => metrics,
            None => self.silent_report(frames, clipping_ratio),
        }
    }

    /// As [`analyze`](Self::analyze); returns `None` if `cancel` fires during
    /// pitch tracking.
    pub fn analyze_cancellable(
        &self,
        frames: &[WaveformFrame],
        timeline: &VoiceActivityTimeline,
        clipping_ratio: f64,
        cancel: &CancellationToken,
    ) -> Option<AudioQualityMetrics> {
        let (voiced, unvoiced): (Vec<&WaveformFrame>, Vec<&WaveformFrame>) = frames
            .iter()
            .partition(|f| timeline.is_frame_voiced(f.index()));

        if voiced.is_empty() || timeline.is_silent() {
            log::warn!(
                "audio_quality: {} voiced frames, treating recording as silent",
                voiced.len()
            );
            return Some(self.silent_report(frames, clipping_ratio));
        }

        let volume = self.volume(&voiced);
        let pitch = self.pitch(&voiced, cancel)?;
        let clarity = self.clarity(&voiced, &unvoiced);

        let recommendation = if clipping_ratio > self.config.max_clipping_ratio {
            CLIPPING_ADVICE.to_string()
        } else {
            let advice: Vec<&str> = [
                volume.quality.advice(),
                clarity.quality.advice(),
                pitch.quality.advice(),
            ]
            .into_iter()
            .flatten()
            .collect();
            if advice.is_empty() {
                GOOD_AUDIO_ADVICE.to_string()
            } else {
                advice.join(" ")
            }
        };

        log::debug!(
            "audio_quality: volume {:.1} dBFS ({:?}), pitch σ {:.1} Hz ({:?}), snr {:.1} dB ({:?}), \
             clipping {:.4}",
            volume.average_db,
            volume.quality,
            pitch.std_dev_hz,
            pitch.quality,
            clarity.snr_db,
            clarity.quality,
            clipping_ratio
        );

        Some(AudioQualityMetrics {
            volume,
            pitch,
            clarity,
            clipping_ratio,
            recommendation,
            degraded: false,
        })
    }

    fn volume(&self, voiced: &[&WaveformFrame]) -> VolumeMetrics {
        let levels: Vec<f64> = voiced.iter().map(|f| f.dbfs()).collect();
        let (mean, std_dev) = mean_and_std_dev(&levels);
        let min = levels.iter().copied().fold(f64::INFINITY, f64::min);
        let max = levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let bands = &self.config.volume;
        let consistency = (100.0 - std_dev / bands.consistency_spread_db * 100.0).clamp(0.0, 100.0);

        VolumeMetrics {
            average_db: mean,
            min_db: min,
            max_db: max,
            consistency,
            quality: VolumeQuality::from_dbfs(mean, bands),
        }
    }

    fn pitch(&self, voiced: &[&WaveformFrame], cancel: &CancellationToken) -> Option<PitchMetrics> {
        let mut estimates = Vec::new();
        for (i, frame) in voiced
            .iter()
            .step_by(self.config.pitch_frame_stride.max(1))
            .enumerate()
        {
            if i % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                log::debug!("audio_quality: cancelled during pitch tracking");
                return None;
            }
            if let Some(f0) = self.pitch.estimate(frame.samples()) {
                estimates.push(f0);
            }
        }

        let bands = &self.config.pitch;
        if estimates.is_empty() {
            return Some(PitchMetrics {
                average_hz: 0.0,
                min_hz: 0.0,
                max_hz: 0.0,
                std_dev_hz: 0.0,
                monotone: true,
                tracked_frames: 0,
                quality: PitchQuality::Monotone,
            });
        }

        let (mean, std_dev) = mean_and_std_dev(&estimates);
        Some(PitchMetrics {
            average_hz: mean,
            min_hz: estimates.iter().copied().fold(f64::INFINITY, f64::min),
            max_hz: estimates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev_hz: std_dev,
            monotone: std_dev < bands.monotone_below_hz,
            tracked_frames: estimates.len(),
            quality: PitchQuality::from_std_dev(std_dev, bands),
        })
    }

    fn clarity(&self, voiced: &[&WaveformFrame], unvoiced: &[&WaveformFrame]) -> ClarityMetrics {
        let bands = &self.config.clarity;
        let signal_power = mean_power(voiced);
        let noise_power = if unvoiced.is_empty() {
            10f64.powf(bands.default_noise_floor_dbfs / 10.0)
        } else {
            mean_power(unvoiced)
        };

        let raw_snr = if noise_power <= 0.0 {
            bands.max_snr_db
        } else if signal_power <= 0.0 {
            0.0
        } else {
            10.0 * (signal_power / noise_power).log10()
        };
        let snr_db = raw_snr.clamp(0.0, bands.max_snr_db);

        ClarityMetrics {
            snr_db,
            noise_floor_db: power_to_db(noise_power),
            signal_level_db: power_to_db(signal_power),
            quality: ClarityQuality::from_snr(snr_db, bands),
        }
    }

    fn silent_report(&self, frames: &[WaveformFrame], clipping_ratio: f64) -> AudioQualityMetrics {
        let all: Vec<&WaveformFrame> = frames.iter().collect();
        AudioQualityMetrics {
            volume: VolumeMetrics {
                average_db: MIN_DBFS,
                min_db: MIN_DBFS,
                max_db: MIN_DBFS,
                consistency: 0.0,
                quality: VolumeQuality::TooQuiet,
            },
            pitch: PitchMetrics {
                average_hz: 0.0,
                min_hz: 0.0,
                max_hz: 0.0,
                std_dev_hz: 0.0,
                monotone: true,
                tracked_frames: 0,
                quality: PitchQuality::Monotone,
            },
            clarity: ClarityMetrics {
                snr_db: 0.0,
                noise_floor_db: power_to_db(mean_power(&all)),
                signal_level_db: MIN_DBFS,
                quality: ClarityQuality::Poor,
            },
            clipping_ratio,
            recommendation: NO_VOICE_ADVICE.to_string(),
            degraded: true,
        }
    }
}

fn mean_power(frames: &[&WaveformFrame]) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    frames
        .iter()
        .map(|f| {
            let r = f.rms() as f64;
            r * r
        })
        .sum::<f64>()
        / frames.len() as f64
}

/// Population mean and standard deviation.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
