//! Analysis orchestration.
//!
//! # Architecture
//!
//! ```text
//! RecordedAudio + Transcript + CancellationToken
//!        │
//!        ▼
//! AnalyticsEngine::analyze()  ← async, one call per recording
//!        │
//!        ├─ spawn_blocking(Preprocessor)              → PreprocessedAudio
//!        │
//!        ├─ try_join!(
//!        │     spawn_blocking(PauseAnalyzer),
//!        │     spawn_blocking(SpeechRateAnalyzer),
//!        │     spawn_blocking(FillerDetector),
//!        │     spawn_blocking(AudioQualityAnalyzer))
//!        │
//!        └─ PerformanceScorer::assemble               → AudioMetrics
//! ```
//!
//! The engine holds only immutable state behind `Arc`s, so one instance can
//! serve concurrent requests.

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{AnalysisError, AnalyticsEngine};
pub use state::{AnalysisOutcome, AnalysisStage};
