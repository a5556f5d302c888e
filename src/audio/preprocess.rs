//! Audio preprocessing: validation → resampling → framing → VAD.
//!
//! [`Preprocessor`] is the first stage of every analysis.  It rejects
//! recordings no analyser could make sense of, converts the rest to the
//! canonical rate, slices them into [`WaveformFrame`]s and segments them into a
//! [`VoiceActivityTimeline`].
//!
//! | Check | Error |
//! |-------|-------|
//! | No samples | [`PreprocessError::EmptyAudio`] |
//! | Rate below `min_sample_rate` | [`PreprocessError::UnsupportedSampleRate`] |
//! | NaN / infinite sample | [`PreprocessError::CorruptAudio`] |
//! | Declared duration disagrees with sample count | [`PreprocessError::CorruptAudio`] |
//!
//! An all-silent recording is *not* an error; [`PreprocessedAudio::is_silent`]
//! reports it so later stages can degrade gracefully.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{AudioConfig, VadConfig};

use super::capture::RecordedAudio;
use super::frame::{Framer, WaveformFrame};
use super::resample::{resample, ResampleError};
use super::timeline::VoiceActivityTimeline;
use super::vad::VadDetector;

// ---------------------------------------------------------------------------
// PreprocessError
// ---------------------------------------------------------------------------

/// Reason a recording could not be preprocessed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("recording contains no samples")]
    EmptyAudio,

    #[error("unsupported sample rate: {rate} Hz (minimum {min} Hz)")]
    UnsupportedSampleRate { rate: u32, min: u32 },

    #[error("corrupt audio: {0}")]
    CorruptAudio(String),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    /// Cancellation was requested mid-way.  The engine reports this as a
    /// cancelled outcome rather than a failure.
    #[error("preprocessing cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// PreprocessedAudio
// ---------------------------------------------------------------------------

/// Canonical-rate frames and voicing for one recording.
#[derive(Debug, Clone)]
pub struct PreprocessedAudio {
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub frames: Vec<WaveformFrame>,
    pub timeline: VoiceActivityTimeline,
    /// Fraction of *original* samples at or above the clipping threshold.
    pub clipping_ratio: f64,
    pub vad_threshold_db: f64,
    pub noise_floor_db: f64,
}

impl PreprocessedAudio {
    /// `true` when VAD found no voiced frame, or so little voicing that the
    /// recording is effectively silent.
    pub fn is_silent(&self) -> bool {
        self.timeline.is_silent()
    }
}

// ---------------------------------------------------------------------------
// Preprocessor
// ---------------------------------------------------------------------------

pub struct Preprocessor {
    audio: AudioConfig,
    vad: VadConfig,
}

impl Preprocessor {
    pub fn new(audio: AudioConfig, vad: VadConfig) -> Self {
        Self { audio, vad }
    }

    /// Run the full preprocessing chain without cancellation.
    pub fn process(&self, recording: &RecordedAudio) -> Result<PreprocessedAudio, PreprocessError> {
        self.process_cancellable(recording, &CancellationToken::new())
    }

    /// Run the full preprocessing chain, stopping early with
    /// [`PreprocessError::Cancelled`] once `cancel` fires.
    pub fn process_cancellable(
        &self,
        recording: &RecordedAudio,
        cancel: &CancellationToken,
    ) -> Result<PreprocessedAudio, PreprocessError> {
        self.validate(recording)?;
        let duration_secs = recording.measured_duration_secs();
        let clipping_ratio = self.clipping_ratio(&recording.samples);

        if cancel.is_cancelled() {
            return Err(PreprocessError::Cancelled);
        }

        let rate = self.audio.canonical_sample_rate;
        let samples = resample(&recording.samples, recording.sample_rate, rate)?;

        if cancel.is_cancelled() {
            return Err(PreprocessError::Cancelled);
        }

        let framer = Framer::new(self.audio.frame_len(), self.audio.hop_len(), rate);
        let frames = framer
            .frames(&samples, cancel)
            .ok_or(PreprocessError::Cancelled)?;

        let decision = VadDetector::new(self.vad.clone()).classify(&frames);
        let timeline = VoiceActivityTimeline::from_frame_flags(
            &decision.voiced,
            framer.frame_secs(),
            framer.hop_secs(),
            duration_secs,
        )
        .with_silent_unvoiced_ratio(self.vad.silent_unvoiced_ratio);

        log::debug!(
            "preprocess: {:.2}s @ {} Hz → {} frames, {} segments, {:.2}s voiced, clipping {:.4}",
            duration_secs,
            recording.sample_rate,
            frames.len(),
            timeline.segments().len(),
            timeline.voiced_secs(),
            clipping_ratio
        );

        Ok(PreprocessedAudio {
            sample_rate: rate,
            duration_secs,
            frames,
            timeline,
            clipping_ratio,
            vad_threshold_db: decision.threshold_db,
            noise_floor_db: decision.noise_floor_db,
        })
    }

    /// Reject recordings that cannot be analysed.
    ///
    /// Checks run in this order: empty → sample rate → sample values →
    /// declared duration.
    pub fn validate(&self, recording: &RecordedAudio) -> Result<(), PreprocessError> {
        if recording.samples.is_empty() {
            return Err(PreprocessError::EmptyAudio);
        }

        if recording.sample_rate < self.audio.min_sample_rate {
            return Err(PreprocessError::UnsupportedSampleRate {
                rate: recording.sample_rate,
                min: self.audio.min_sample_rate,
            });
        }

        if let Some(index) = recording.samples.iter().position(|s| !s.is_finite()) {
            return Err(PreprocessError::CorruptAudio(format!(
                "non-finite sample at index {index}"
            )));
        }

        let measured = recording.measured_duration_secs();
        if !recording.duration_secs.is_finite()
            || (recording.duration_secs - measured).abs() > self.audio.duration_tolerance_secs
        {
            return Err(PreprocessError::CorruptAudio(format!(
                "declared duration {:.3}s does not match {} samples at {} Hz ({measured:.3}s)",
                recording.duration_secs,
                recording.samples.len(),
                recording.sample_rate
            )));
        }

        Ok(())
    }

    fn clipping_ratio(&self, samples: &[f32]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let clipped = samples
            .iter()
            .filter(|s| s.abs() >= self.audio.clipping_threshold)
            .count();
        clipped as f64 / samples.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
