//! The four analysers and the composite scorer.
//!
//! # Architecture
//!
//! ```text
//!                  PreprocessedAudio + Transcript
//!                              │
//!        ┌──────────────┬──────┴───────┬────────────────┐
//!        ▼              ▼              ▼                ▼
//!  PauseAnalyzer  SpeechRate-    FillerDetector  AudioQuality-
//!                 Analyzer       (+ lexicon)     Analyzer (+ pitch)
//!        │              │              │                │
//!        └──────────────┴──────┬───────┴────────────────┘
//!                              ▼
//!                     PerformanceScorer ──▶ AudioMetrics
//! ```
//!
//! Analysers are pure functions of their inputs.  None of them fails: degraded
//! inputs produce a best-effort report plus [`AnalysisWarning`]s.

pub mod audio_quality;
pub mod filler;
pub mod lexicon;
pub mod pause;
pub mod pitch;
pub mod scorer;
pub mod speech_rate;

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use audio_quality::{
    AudioQualityAnalyzer, AudioQualityMetrics, ClarityMetrics, ClarityQuality, PitchMetrics,
    PitchQuality, VolumeMetrics, VolumeQuality,
};
pub use filler::{DetectedFiller, FillerDetector, FillerQuality, FillerWordsAnalysis};
pub use lexicon::{FillerKind, FillerLexicon, LexiconEntry, LexiconSet};
pub use pause::{Pause, PauseAnalysis, PauseAnalyzer, PauseCategory, PauseDistribution, PauseQuality};
pub use pitch::PitchTracker;
pub use scorer::{
    ComparedToOptimal, PerformanceLevel, PerformanceScorer, SpeakingPerformance, SubScores,
};
pub use speech_rate::{ArticulationMetrics, SpeechRateAnalyzer, SpeechRateMetrics, SpeechRateQuality};

// ---------------------------------------------------------------------------
// AnalysisWarning
// ---------------------------------------------------------------------------

/// A degraded-input advisory attached to the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisWarning {
    /// VAD found no voiced frame; pause and audio-quality figures are
    /// placeholders.
    EmptyOrSilentAudio,
    /// The transcript has no words; speech-rate and filler figures are zero.
    EmptyTranscript,
    /// No filler lexicon for the transcript language; a fallback was used
    /// with reduced confidence.
    UnknownLanguage { requested: String, fallback: String },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::EmptyOrSilentAudio => {
                write!(f, "no voiced audio detected; pause and audio metrics are degraded")
            }
            AnalysisWarning::EmptyTranscript => {
                write!(f, "transcript contains no words; speech rate and filler metrics are zero")
            }
            AnalysisWarning::UnknownLanguage {
                requested,
                fallback,
            } => write!(
                f,
                "no filler lexicon for language `{requested}`; fell back to `{fallback}`"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// StageOutput
// ---------------------------------------------------------------------------

/// An analyser's report plus any warnings it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub report: T,
    pub warnings: Vec<AnalysisWarning>,
}

impl<T> StageOutput<T> {
    pub fn clean(report: T) -> Self {
        Self {
            report,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: AnalysisWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

// ---------------------------------------------------------------------------
// QualityBand
// ---------------------------------------------------------------------------

/// Position of a measured value relative to its optimal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    Below,
    Optimal,
    Above,
}

/// Where a bucket sits for the strengths/weaknesses rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// The dimension's best bucket: reported as a strength.
    Best,
    Middle,
    /// The dimension's worst bucket(s): reported as a weakness.
    Worst,
}

/// A closed set of quality buckets with fixed scoring tables.
///
/// Implementations live in [`scorer`] so all tables sit side by side.
pub trait QualityBand: Copy + Sized + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// 0–100 contribution of this bucket to its dimension's sub-score.
    fn sub_score(self) -> f64;

    fn comparison(self) -> Comparison;

    fn standing(self) -> Standing;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
