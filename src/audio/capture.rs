//! Recorded audio and the capture collaborator.
//!
//! [`RecordedAudio`] is the engine's input: mono `f32` PCM in `[-1.0, 1.0]`
//! plus the rate it was recorded at and the duration the capture source
//! declared.  Capture hardware is outside this crate; anything that can produce
//! a recording implements [`AudioCaptureProvider`].  [`WavFileCapture`] reads
//! one from a WAV file via `hound`, downmixing with [`stereo_to_mono`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::resample::stereo_to_mono;

// ---------------------------------------------------------------------------
// RecordedAudio
// ---------------------------------------------------------------------------

/// A complete mono recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    /// Mono PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Duration as reported by the capture source, in seconds.
    pub duration_secs: f64,
}

impl RecordedAudio {
    /// Build a recording whose declared duration matches its sample count.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };
        Self {
            samples,
            sample_rate,
            duration_secs,
        }
    }

    /// Override the declared duration (e.g. from container metadata).
    pub fn with_declared_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Duration implied by `samples.len() / sample_rate`.
    pub fn measured_duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while obtaining a recording.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read WAV file {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("unsupported WAV format in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// The capture device or service failed.
    #[error("audio capture failed: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// AudioCaptureProvider trait
// ---------------------------------------------------------------------------

/// Source of complete recordings.
pub trait AudioCaptureProvider: Send + Sync {
    fn capture(&self) -> Result<RecordedAudio, CaptureError>;
}

// ---------------------------------------------------------------------------
// WavFileCapture
// ---------------------------------------------------------------------------

/// Reads a recording from a PCM or IEEE-float WAV file.
///
/// ```rust,no_run
/// use speech_analytics::audio::{AudioCaptureProvider, WavFileCapture};
///
/// let audio = WavFileCapture::new("talk.wav").capture().unwrap();
/// println!("{:.1}s @ {} Hz", audio.duration_secs, audio.sample_rate);
/// ```
pub struct WavFileCapture {
    path: PathBuf,
}

impl WavFileCapture {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn wav_error(&self, source: hound::Error) -> CaptureError {
        CaptureError::Wav {
            path: self.path.clone(),
            source,
        }
    }
}

impl AudioCaptureProvider for WavFileCapture {
    fn capture(&self) -> Result<RecordedAudio, CaptureError> {
        let mut reader = hound::WavReader::open(&self.path).map_err(|e| self.wav_error(e))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| self.wav_error(e))?,
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(CaptureError::UnsupportedFormat {
                        path: self.path.clone(),
                        reason: format!("{} bits per sample", spec.bits_per_sample),
                    });
                }
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| self.wav_error(e))?
            }
        };

        let samples = stereo_to_mono(&interleaved, spec.channels);
        let audio = RecordedAudio::new(samples, spec.sample_rate);
        log::debug!(
            "capture: read {} ({} ch, {} Hz, {:.2}s)",
            self.path.display(),
            spec.channels,
            spec.sample_rate,
            audio.duration_secs
        );
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
