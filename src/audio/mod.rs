//! Audio input and preprocessing.
//!
//! ```text
//! RecordedAudio ──▶ Preprocessor
//!                     ├─ validate  (empty / rate / NaN / duration)
//!                     ├─ resample  (rubato → canonical rate)
//!                     ├─ Framer    (25 ms windows, 10 ms hop)
//!                     └─ VadDetector ──▶ VoiceActivityTimeline
//! ```

pub mod capture;
pub mod frame;
pub mod preprocess;
pub mod resample;
pub mod timeline;
pub mod vad;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use capture::{AudioCaptureProvider, CaptureError, RecordedAudio, WavFileCapture};
pub use frame::{amplitude_to_dbfs, power_to_db, rms, Framer, WaveformFrame, MIN_DBFS};
pub use preprocess::{PreprocessError, PreprocessedAudio, Preprocessor};
pub use resample::{resample, resampled_len, stereo_to_mono, ResampleError};
pub use timeline::{VoiceActivityTimeline, VoiceSegment};
pub use vad::{VadDecision, VadDetector};
