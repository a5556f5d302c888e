//! Analytics engine: drives one (audio, transcript) pair through the
//! preprocessor, the four analysers and the scorer.
//!
//! # Flow
//!
//! ```text
//! analyze(&audio, &transcript, &cancel)
//!   └─▶ spawn_blocking(Preprocessor::process_cancellable)      [Preprocessing]
//!         ├─ Err(Cancelled)  → Ok(Cancelled)
//!         ├─ Err(e)          → Err(AnalysisError::Preprocess)
//!         └─▶ Transcript::validate                              → Err(Transcript)
//!               └─▶ try_join!(pause, rate, filler, quality)    [Analyzing]
//!                     └─▶ PerformanceScorer::assemble           [Scoring]
//!                           └─▶ Ok(Completed(AudioMetrics))
//! ```
//!
//! All CPU work runs on `tokio::task::spawn_blocking` so the async runtime
//! never stalls.  Every await point races against the cancellation token.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::analysis::{
    AnalysisWarning, AudioQualityAnalyzer, FillerDetector, LexiconSet, PauseAnalyzer,
    PerformanceScorer, SpeechRateAnalyzer,
};
use crate::audio::{PreprocessError, Preprocessor, RecordedAudio};
use crate::config::{AnalyticsConfig, ConfigError};
use crate::transcript::{Transcript, TranscriptError};

use super::state::{AnalysisOutcome, AnalysisStage};

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Reasons a single analysis call fails.
///
/// Degraded inputs (silence, empty transcript, unknown language) are not
/// errors; they surface as warnings on the report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("audio rejected: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("transcript rejected: {0}")]
    Transcript(#[from] TranscriptError),

    /// A blocking task panicked or was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for AnalysisError {
    fn from(e: tokio::task::JoinError) -> Self {
        AnalysisError::Internal(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// AnalyticsEngine
// ---------------------------------------------------------------------------

/// Immutable, cheaply clonable analysis engine.
///
/// Configuration and lexicons are validated once in [`new`](Self::new); after
/// that [`analyze`](Self::analyze) can be called concurrently from any number
/// of tasks.
///
/// ```rust,no_run
/// use speech_analytics::audio::RecordedAudio;
/// use speech_analytics::config::AnalyticsConfig;
/// use speech_analytics::pipeline::AnalyticsEngine;
/// use speech_analytics::transcript::Transcript;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let engine = AnalyticsEngine::new(AnalyticsConfig::default())?;
/// let audio = RecordedAudio::new(vec![0.0; 16_000], 16_000);
/// let transcript = Transcript::new("en", Vec::new());
///
/// let outcome = engine
///     .analyze(&audio, &transcript, &CancellationToken::new())
///     .await?;
/// if let Some(metrics) = outcome.into_metrics() {
///     println!("{}", metrics.to_json_pretty()?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AnalyticsEngine {
    config: Arc<AnalyticsConfig>,
    lexicons: Arc<LexiconSet>,
    scorer: Arc<PerformanceScorer>,
}

impl AnalyticsEngine {
    /// Validate `config` and load the built-in plus configured lexicons.
    pub fn new(config: AnalyticsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lexicons = LexiconSet::load(&config.filler)?;
        Self::with_lexicons(config, lexicons)
    }

    /// Use an already-built lexicon set instead of loading one.
    pub fn with_lexicons(config: AnalyticsConfig, lexicons: LexiconSet) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = PerformanceScorer::new(config.scorer.weights)?;
        log::info!(
            "engine: ready ({} Hz canonical, lexicons: {})",
            config.audio.canonical_sample_rate,
            lexicons.languages().collect::<Vec<_>>().join(", ")
        );
        Ok(Self {
            config: Arc::new(config),
            lexicons: Arc::new(lexicons),
            scorer: Arc::new(scorer),
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn lexicons(&self) -> &LexiconSet {
        &self.lexicons
    }

    /// Analyse one recording against its transcript.
    ///
    /// Returns `Ok(AnalysisOutcome::Cancelled)` if `cancel` fires before the
    /// report is assembled.
    pub async fn analyze(
        &self,
        audio: &RecordedAudio,
        transcript: &Transcript,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if cancel.is_cancelled() {
            return Ok(AnalysisOutcome::Cancelled);
        }
        let started = Instant::now();

        // ── 1. Preprocess (hard barrier) ─────────────────────────────────
        let preprocessor = Preprocessor::new(self.config.audio.clone(), self.config.vad.clone());
        let recording = audio.clone();
        let token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            preprocessor.process_cancellable(&recording, &token)
        });

        let preprocessed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled(AnalysisStage::Preprocessing)),
            joined = task => joined?,
        };
        let preprocessed = match preprocessed {
            Ok(p) => Arc::new(p),
            Err(PreprocessError::Cancelled) => {
                return Ok(self.cancelled(AnalysisStage::Preprocessing))
            }
            Err(e) => {
                log::warn!("engine: {e}");
                return Err(e.into());
            }
        };
        log::debug!(
            "engine: {} done in {:?}",
            AnalysisStage::Preprocessing,
            started.elapsed()
        );

        let duration = preprocessed.duration_secs;
        transcript.validate(duration, self.config.audio.transcript_tolerance_secs)?;

        let mut warnings = Vec::new();
        if preprocessed.is_silent() {
            log::warn!("engine: no voiced frames detected");
            warnings.push(AnalysisWarning::EmptyOrSilentAudio);
        }

        // ── 2. Four analysers in parallel ────────────────────────────────
        let analyzing = Instant::now();
        let transcript = Arc::new(transcript.clone());
        let pause_analyzer = PauseAnalyzer::new(self.config.pause.clone());
        let total_pause = pause_analyzer.total_pause_secs(&preprocessed.timeline);

        let pause_task = {
            let pre = Arc::clone(&preprocessed);
            let words = Arc::clone(&transcript);
            tokio::task::spawn_blocking(move || pause_analyzer.analyze(&pre.timeline, &words))
        };
        let rate_task = {
            let analyzer = SpeechRateAnalyzer::new(self.config.speech_rate.clone());
            let words = Arc::clone(&transcript);
            tokio::task::spawn_blocking(move || analyzer.analyze(&words, duration, total_pause))
        };
        let filler_task = {
            let detector =
                FillerDetector::new(self.config.filler.clone(), Arc::clone(&self.lexicons));
            let words = Arc::clone(&transcript);
            tokio::task::spawn_blocking(move || detector.analyze(&words, duration))
        };
        let quality_task = {
            let analyzer = AudioQualityAnalyzer::new(
                self.config.audio_quality.clone(),
                preprocessed.sample_rate,
            );
            let pre = Arc::clone(&preprocessed);
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || {
                analyzer.analyze_cancellable(&pre.frames, &pre.timeline, pre.clipping_ratio, &token)
            })
        };

        let (pauses, rate, fillers, quality) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled(AnalysisStage::Analyzing)),
            joined = async { tokio::try_join!(pause_task, rate_task, filler_task, quality_task) } => joined?,
        };
        let Some(quality) = quality else {
            return Ok(self.cancelled(AnalysisStage::Analyzing));
        };
        log::debug!(
            "engine: {} done in {:?}",
            AnalysisStage::Analyzing,
            analyzing.elapsed()
        );

        // ── 3. Score ─────────────────────────────────────────────────────
        warnings.extend(pauses.warnings);
        warnings.extend(rate.warnings);
        warnings.extend(fillers.warnings);

        let metrics = self.scorer.assemble(
            rate.report,
            pauses.report,
            fillers.report,
            quality,
            warnings,
        );

        log::info!(
            "engine: analysis complete in {:?}: score {:.1} ({:?}), {} warning(s)",
            started.elapsed(),
            metrics.speaking_performance.overall_score,
            metrics.speaking_performance.level,
            metrics.warnings.len()
        );

        Ok(AnalysisOutcome::Completed(Box::new(metrics)))
    }

    fn cancelled(&self, stage: AnalysisStage) -> AnalysisOutcome {
        log::info!("engine: cancelled during {stage}");
        AnalysisOutcome::Cancelled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ClarityQuality;
    use crate::transcript::TranscriptWord;

    const RATE: u32 = 16_000;

    fn tone(secs: f64) -> Vec<f32> {
        (0..(RATE as f64 * secs) as usize)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 150.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    /// 2 s speech, 1 s silence, 2 s speech.
    fn recording() -> RecordedAudio {
        let mut samples = tone(2.0);
        samples.extend(vec![0.0; RATE as usize]);
        samples.extend(tone(2.0));
        RecordedAudio::new(samples, RATE)
    }

    fn transcript(language: &str) -> Transcript {
        let words = ["we", "ship", "um", "the", "new", "release", "next", "week"];
        let starts = [0.1, 0.5, 1.0, 1.5, 3.1, 3.6, 4.1, 4.5];
        Transcript::new(
            language,
            words
                .iter()
                .zip(starts)
                .map(|(w, s)| TranscriptWord::new(*w, s, s + 0.35))
                .collect(),
        )
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(AnalyticsConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn analyzes_speech_with_one_pause() {
        let metrics = engine()
            .analyze(&recording(), &transcript("en"), &CancellationToken::new())
            .await
            .unwrap()
            .into_metrics()
            .unwrap();

        assert_eq!(metrics.pause_analysis.total_pauses, 1);
        assert_eq!(metrics.filler_words.total_count, 1);
        assert_eq!(metrics.speech_rate.total_words, 8);
        assert!(metrics.warnings.is_empty(), "{:?}", metrics.warnings);
        let score = metrics.speaking_performance.overall_score;
        assert!((0.0..=100.0).contains(&score));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = engine()
            .analyze(&recording(), &transcript("en"), &cancel)
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn low_sample_rate_is_an_error() {
        let audio = RecordedAudio::new(vec![0.1; 4_000], 4_000);
        let err = engine()
            .analyze(&audio, &Transcript::new("en", Vec::new()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Preprocess(PreprocessError::UnsupportedSampleRate { .. })
        ));
    }

    #[tokio::test]
    async fn transcript_past_audio_end_is_an_error() {
        let long = Transcript::new("en", vec![TranscriptWord::new("late", 9.0, 9.5)]);
        let err = engine()
            .analyze(&recording(), &long, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Transcript(TranscriptError::Mismatch { .. })
        ));
    }

    #[tokio::test]
    async fn silent_audio_degrades_instead_of_failing() {
        let silent = RecordedAudio::new(vec![0.0; RATE as usize * 3], RATE);
        let metrics = engine()
            .analyze(&silent, &Transcript::new("en", Vec::new()), &CancellationToken::new())
            .await
            .unwrap()
            .into_metrics()
            .unwrap();

        assert_eq!(metrics.audio_quality.clarity.quality, ClarityQuality::Poor);
        assert_eq!(
            metrics.warnings,
            vec![AnalysisWarning::EmptyOrSilentAudio, AnalysisWarning::EmptyTranscript]
        );
    }

    #[tokio::test]
    async fn unknown_language_falls_back_with_warning() {
        let metrics = engine()
            .analyze(&recording(), &transcript("sv"), &CancellationToken::new())
            .await
            .unwrap()
            .into_metrics()
            .unwrap();

        assert!(metrics.warnings.contains(&AnalysisWarning::UnknownLanguage {
            requested: "sv".into(),
            fallback: "en".into(),
        }));
    }

    #[tokio::test]
    async fn engine_is_shareable_across_tasks() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine
                        .analyze(&recording(), &transcript("en"), &CancellationToken::new())
                        .await
                        .unwrap()
                        .into_metrics()
                        .unwrap()
                        .to_json()
                        .unwrap()
                })
            })
            .collect();

        let mut reports = Vec::new();
        for h in handles {
            reports.push(h.await.unwrap());
        }
        assert!(reports.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn invalid_weights_fail_construction() {
        let mut config = AnalyticsConfig::default();
        config.scorer.weights.filler_words = 0.0;
        assert!(matches!(
            AnalyticsEngine::new(config),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }
}
