//! Composite performance score, strengths, weaknesses and suggestions.
//!
//! Every quality bucket maps to a fixed 0–100 sub-score (see the
//! [`QualityBand`] impls below).  The audio sub-score is the mean of volume,
//! pitch and clarity.  The overall score is the weighted sum of the four
//! dimension sub-scores with weights that must add up to exactly 100:
//!
//! | Dimension | Default weight |
//! |-----------|----------------|
//! | speech rate | 25 |
//! | pauses | 20 |
//! | filler words | 25 |
//! | audio quality | 30 |
//!
//! Feedback rules run per dimension in a fixed order (rate, pauses, fillers,
//! volume, pitch, clarity): a best bucket adds a strength, a worst bucket adds
//! a weakness and a suggestion.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ScorerWeights};
use crate::report::AudioMetrics;

use super::{
    AnalysisWarning, AudioQualityMetrics, ClarityQuality, Comparison, FillerQuality,
    FillerWordsAnalysis, PauseAnalysis, PauseQuality, PitchQuality, QualityBand,
    SpeechRateMetrics, SpeechRateQuality, Standing, VolumeQuality,
};

// ---------------------------------------------------------------------------
// Scoring tables
// ---------------------------------------------------------------------------

impl QualityBand for SpeechRateQuality {
    const ALL: &'static [Self] = &[Self::Slow, Self::Optimal, Self::Fast, Self::VeryFast];

    fn sub_score(self) -> f64 {
        match self {
            Self::Slow => 60.0,
            Self::Optimal => 100.0,
            Self::Fast => 70.0,
            Self::VeryFast => 40.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::Slow => Comparison::Below,
            Self::Optimal => Comparison::Optimal,
            Self::Fast | Self::VeryFast => Comparison::Above,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Optimal => Standing::Best,
            Self::Fast => Standing::Middle,
            Self::Slow | Self::VeryFast => Standing::Worst,
        }
    }
}

impl QualityBand for PauseQuality {
    const ALL: &'static [Self] = &[
        Self::TooRare,
        Self::Optimal,
        Self::TooFrequent,
        Self::Indeterminate,
    ];

    fn sub_score(self) -> f64 {
        match self {
            Self::TooRare => 60.0,
            Self::Optimal => 100.0,
            Self::TooFrequent => 60.0,
            Self::Indeterminate => 50.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::TooRare | Self::Indeterminate => Comparison::Below,
            Self::Optimal => Comparison::Optimal,
            Self::TooFrequent => Comparison::Above,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Optimal => Standing::Best,
            Self::Indeterminate => Standing::Middle,
            Self::TooRare | Self::TooFrequent => Standing::Worst,
        }
    }
}

impl QualityBand for FillerQuality {
    const ALL: &'static [Self] = &[Self::Excellent, Self::Good, Self::Fair, Self::Poor];

    fn sub_score(self) -> f64 {
        match self {
            Self::Excellent => 100.0,
            Self::Good => 80.0,
            Self::Fair => 55.0,
            Self::Poor => 30.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::Excellent | Self::Good => Comparison::Optimal,
            Self::Fair | Self::Poor => Comparison::Above,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Excellent => Standing::Best,
            Self::Good | Self::Fair => Standing::Middle,
            Self::Poor => Standing::Worst,
        }
    }
}

impl QualityBand for VolumeQuality {
    const ALL: &'static [Self] = &[
        Self::TooQuiet,
        Self::Quiet,
        Self::Optimal,
        Self::Loud,
        Self::TooLoud,
    ];

    fn sub_score(self) -> f64 {
        match self {
            Self::TooQuiet => 30.0,
            Self::Quiet => 65.0,
            Self::Optimal => 100.0,
            Self::Loud => 75.0,
            Self::TooLoud => 40.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::TooQuiet | Self::Quiet => Comparison::Below,
            Self::Optimal => Comparison::Optimal,
            Self::Loud | Self::TooLoud => Comparison::Above,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Optimal => Standing::Best,
            Self::Quiet | Self::Loud => Standing::Middle,
            Self::TooQuiet | Self::TooLoud => Standing::Worst,
        }
    }
}

impl QualityBand for PitchQuality {
    const ALL: &'static [Self] = &[
        Self::Monotone,
        Self::LowVariation,
        Self::Optimal,
        Self::HighVariation,
    ];

    fn sub_score(self) -> f64 {
        match self {
            Self::Monotone => 40.0,
            Self::LowVariation => 70.0,
            Self::Optimal => 100.0,
            Self::HighVariation => 75.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::Monotone | Self::LowVariation => Comparison::Below,
            Self::Optimal => Comparison::Optimal,
            Self::HighVariation => Comparison::Above,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Optimal => Standing::Best,
            Self::LowVariation | Self::HighVariation => Standing::Middle,
            Self::Monotone => Standing::Worst,
        }
    }
}

impl QualityBand for ClarityQuality {
    const ALL: &'static [Self] = &[Self::Poor, Self::Fair, Self::Good, Self::Excellent];

    fn sub_score(self) -> f64 {
        match self {
            Self::Poor => 30.0,
            Self::Fair => 60.0,
            Self::Good => 85.0,
            Self::Excellent => 100.0,
        }
    }

    fn comparison(self) -> Comparison {
        match self {
            Self::Poor | Self::Fair => Comparison::Below,
            Self::Good | Self::Excellent => Comparison::Optimal,
        }
    }

    fn standing(self) -> Standing {
        match self {
            Self::Excellent => Standing::Best,
            Self::Fair | Self::Good => Standing::Middle,
            Self::Poor => Standing::Worst,
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback text
// ---------------------------------------------------------------------------

/// Feedback sentences for one dimension.  `weakness` is only consulted for
/// buckets whose standing is [`Standing::Worst`].
trait Remarks: QualityBand {
    fn strength(self) -> &'static str;

    /// `(weakness, suggestion)`
    fn weakness(self) -> (&'static str, &'static str);
}

impl Remarks for SpeechRateQuality {
    fn strength(self) -> &'static str {
        "Your speaking pace is comfortable to follow."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        match self {
            Self::Slow => (
                "Your speaking pace is slow.",
                "Tighten transitions and trim long hesitations to pick up the pace.",
            ),
            _ => (
                "You speak very fast.",
                "Slow down and breathe between sentences so listeners can keep up.",
            ),
        }
    }
}

impl Remarks for PauseQuality {
    fn strength(self) -> &'static str {
        "You use pauses effectively."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        match self {
            Self::TooRare => (
                "You rarely pause.",
                "Pause briefly after key points to give listeners time to absorb them.",
            ),
            _ => (
                "Your speech is broken up by frequent pauses.",
                "Rehearse the material so that ideas connect without stopping.",
            ),
        }
    }
}

impl Remarks for FillerQuality {
    fn strength(self) -> &'static str {
        "You use very few filler words."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        (
            "Filler words are frequent.",
            "Replace fillers with a short silent pause while you think.",
        )
    }
}

impl Remarks for VolumeQuality {
    fn strength(self) -> &'static str {
        "Your volume is well balanced."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        match self {
            Self::TooQuiet => (
                "Your voice is too quiet.",
                "Move closer to the microphone or project your voice more.",
            ),
            _ => (
                "Your voice is too loud.",
                "Lower the input gain or step back from the microphone.",
            ),
        }
    }
}

impl Remarks for PitchQuality {
    fn strength(self) -> &'static str {
        "Your intonation is expressive."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        (
            "Your delivery is monotone.",
            "Vary your pitch to emphasise important words.",
        )
    }
}

impl Remarks for ClarityQuality {
    fn strength(self) -> &'static str {
        "Your recording is clear with little background noise."
    }

    fn weakness(self) -> (&'static str, &'static str) {
        (
            "Background noise reduces clarity.",
            "Record in a quieter room or use a closer microphone.",
        )
    }
}

const NO_SPEECH: (&str, &str) = (
    "No speech was found in the transcript.",
    "Check that the recording contains speech and that the transcript belongs to it.",
);
/// Filler sub-score when the transcript is empty: no words means no evidence
/// of fluency, so it sits with the other undeterminable buckets.
const NO_SPEECH_FILLER_SCORE: f64 = 50.0;

const NO_VOICE: (&str, &str) = (
    "No voiced audio was detected.",
    "Check that the microphone is connected, unmuted and close enough.",
);

#[derive(Default)]
struct Feedback {
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    suggestions: Vec<String>,
}

impl Feedback {
    fn judge<Q: Remarks>(&mut self, quality: Q) {
        match quality.standing() {
            Standing::Best => self.strengths.push(quality.strength().to_string()),
            Standing::Middle => {}
            Standing::Worst => self.weakness(quality.weakness()),
        }
    }

    fn weakness(&mut self, (weakness, suggestion): (&str, &str)) {
        self.weaknesses.push(weakness.to_string());
        self.suggestions.push(suggestion.to_string());
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub speech_rate: f64,
    pub pauses: f64,
    pub filler_words: f64,
    /// Mean of `volume`, `pitch` and `clarity`.
    pub audio_quality: f64,
    pub volume: f64,
    pub pitch: f64,
    pub clarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedToOptimal {
    pub speech_rate: Comparison,
    pub pauses: Comparison,
    pub filler_words: Comparison,
    pub volume: Comparison,
    pub pitch_variation: Comparison,
    pub clarity: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingPerformance {
    /// 0–100, one decimal place.
    pub overall_score: f64,
    pub level: PerformanceLevel,
    pub sub_scores: SubScores,
    pub compared_to_optimal: ComparedToOptimal,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// PerformanceScorer
// ---------------------------------------------------------------------------

pub struct PerformanceScorer {
    weights: ScorerWeights,
}

impl PerformanceScorer {
    /// Fails unless the weights are non-negative and sum to 100.
    pub fn new(weights: ScorerWeights) -> Result<Self, ConfigError> {
        let sum = weights.sum();
        let valid = [
            weights.speech_rate,
            weights.pauses,
            weights.filler_words,
            weights.audio_quality,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0);
        if !valid || (sum - 100.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScorerWeights {
        &self.weights
    }

    pub fn score(
        &self,
        rate: &SpeechRateMetrics,
        pauses: &PauseAnalysis,
        fillers: &FillerWordsAnalysis,
        audio: &AudioQualityMetrics,
        warnings: &[AnalysisWarning],
    ) -> SpeakingPerformance {
        let no_speech = warnings.contains(&AnalysisWarning::EmptyTranscript);
        let no_voice = warnings.contains(&AnalysisWarning::EmptyOrSilentAudio);

        let volume = audio.volume.quality.sub_score();
        let pitch = audio.pitch.quality.sub_score();
        let clarity = audio.clarity.quality.sub_score();
        let sub_scores = SubScores {
            speech_rate: rate.quality.sub_score(),
            pauses: pauses.quality.sub_score(),
            filler_words: if no_speech {
                NO_SPEECH_FILLER_SCORE
            } else {
                fillers.quality.sub_score()
            },
            audio_quality: (volume + pitch + clarity) / 3.0,
            volume,
            pitch,
            clarity,
        };

        let w = &self.weights;
        let weighted = (w.speech_rate * sub_scores.speech_rate
            + w.pauses * sub_scores.pauses
            + w.filler_words * sub_scores.filler_words
            + w.audio_quality * sub_scores.audio_quality)
            / 100.0;
        let overall_score = (weighted.clamp(0.0, 100.0) * 10.0).round() / 10.0;

        let compared_to_optimal = ComparedToOptimal {
            speech_rate: rate.quality.comparison(),
            pauses: pauses.quality.comparison(),
            filler_words: if no_speech {
                Comparison::Below
            } else {
                fillers.quality.comparison()
            },
            volume: audio.volume.quality.comparison(),
            pitch_variation: audio.pitch.quality.comparison(),
            clarity: audio.clarity.quality.comparison(),
        };

        let mut feedback = Feedback::default();
        if no_speech {
            feedback.weakness(NO_SPEECH);
        } else {
            feedback.judge(rate.quality);
        }
        feedback.judge(pauses.quality);
        if !no_speech {
            feedback.judge(fillers.quality);
        }
        if no_voice {
            feedback.weakness(NO_VOICE);
        } else {
            feedback.judge(audio.volume.quality);
            feedback.judge(audio.pitch.quality);
            feedback.judge(audio.clarity.quality);
        }

        let level = PerformanceLevel::from_score(overall_score);
        log::debug!(
            "scorer: overall {overall_score:.1} ({level:?}), {} strengths, {} weaknesses",
            feedback.strengths.len(),
            feedback.weaknesses.len()
        );

        SpeakingPerformance {
            overall_score,
            level,
            sub_scores,
            compared_to_optimal,
            strengths: feedback.strengths,
            weaknesses: feedback.weaknesses,
            suggestions: feedback.suggestions,
        }
    }

    /// Score the four reports and bundle everything into the final artifact.
    /// Duplicate warnings are dropped; first occurrence wins.
    pub fn assemble(
        &self,
        speech_rate: SpeechRateMetrics,
        pause_analysis: PauseAnalysis,
        filler_words: FillerWordsAnalysis,
        audio_quality: AudioQualityMetrics,
        warnings: Vec<AnalysisWarning>,
    ) -> AudioMetrics {
        let mut unique: Vec<AnalysisWarning> = Vec::with_capacity(warnings.len());
        for w in warnings {
            if !unique.contains(&w) {
                unique.push(w);
            }
        }

        let speaking_performance = self.score(
            &speech_rate,
            &pause_analysis,
            &filler_words,
            &audio_quality,
            &unique,
        );

        AudioMetrics {
            speech_rate,
            pause_analysis,
            filler_words,
            audio_quality,
            speaking_performance,
            warnings: unique,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::analysis::{
        ArticulationMetrics, ClarityMetrics, PauseDistribution, PitchMetrics, VolumeMetrics,
    };

    fn rate(quality: SpeechRateQuality) -> SpeechRateMetrics {
        SpeechRateMetrics {
            words_per_minute: 140.0,
            total_words: 140,
            total_duration_secs: 60.0,
            articulation: ArticulationMetrics {
                rate: 150.0,
                speaking_time_secs: 56.0,
            },
            pace_variation: 5.0,
            quality,
            recommendation: String::new(),
        }
    }

    fn pauses(quality: PauseQuality) -> PauseAnalysis {
        PauseAnalysis {
            total_pauses: 4,
            total_pause_duration: 4.0,
            average_pause_duration: 1.0,
            min_pause_duration: 0.6,
            max_pause_duration: 1.4,
            pauses_per_minute: 4.3,
            pause_ratio: 6.7,
            distribution: PauseDistribution {
                short: 0,
                medium: 4,
                long: 0,
            },
            quality,
            degraded: false,
            pauses: Vec::new(),
        }
    }

    fn fillers(quality: FillerQuality) -> FillerWordsAnalysis {
        FillerWordsAnalysis {
            total_count: 0,
            filler_rate: 0.0,
            fillers_per_minute: 0.0,
            by_type: BTreeMap::new(),
            most_common: None,
            quality,
            recommendation: String::new(),
            lexicon_language: "en".into(),
            detected_fillers: Vec::new(),
        }
    }

    fn audio(v: VolumeQuality, p: PitchQuality, c: ClarityQuality) -> AudioQualityMetrics {
        AudioQualityMetrics {
            volume: VolumeMetrics {
                average_db: -18.0,
                min_db: -25.0,
                max_db: -12.0,
                consistency: 80.0,
                quality: v,
            },
            pitch: PitchMetrics {
                average_hz: 150.0,
                min_hz: 110.0,
                max_hz: 210.0,
                std_dev_hz: 35.0,
                monotone: false,
                tracked_frames: 100,
                quality: p,
            },
            clarity: ClarityMetrics {
                snr_db: 35.0,
                noise_floor_db: -55.0,
                signal_level_db: -20.0,
                quality: c,
            },
            clipping_ratio: 0.0,
            recommendation: String::new(),
            degraded: false,
        }
    }

    fn scorer() -> PerformanceScorer {
        PerformanceScorer::new(ScorerWeights::default()).unwrap()
    }

    fn assert_table<Q: QualityBand + std::fmt::Debug>() {
        let mut best = 0;
        for q in Q::ALL {
            let s = q.sub_score();
            assert!((0.0..=100.0).contains(&s), "{q:?} scores {s}");
            if q.standing() == Standing::Best {
                best += 1;
                assert_eq!(q.comparison(), Comparison::Optimal, "{q:?}");
            }
        }
        assert_eq!(best, 1, "exactly one best bucket");
    }

    #[test]
    fn every_table_is_total_and_bounded() {
        assert_table::<SpeechRateQuality>();
        assert_table::<PauseQuality>();
        assert_table::<FillerQuality>();
        assert_table::<VolumeQuality>();
        assert_table::<PitchQuality>();
        assert_table::<ClarityQuality>();
    }

    #[test]
    fn all_optimal_scores_100() {
        let perf = scorer().score(
            &rate(SpeechRateQuality::Optimal),
            &pauses(PauseQuality::Optimal),
            &fillers(FillerQuality::Excellent),
            &audio(VolumeQuality::Optimal, PitchQuality::Optimal, ClarityQuality::Excellent),
            &[],
        );
        assert_eq!(perf.overall_score, 100.0);
        assert_eq!(perf.level, PerformanceLevel::Excellent);
        assert_eq!(perf.strengths.len(), 6);
        assert!(perf.weaknesses.is_empty());
        assert_eq!(perf.compared_to_optimal.speech_rate, Comparison::Optimal);
    }

    #[test]
    fn weighted_sum_uses_audio_mean() {
        // rate 60·25 + pauses 60·20 + fillers 30·25 + audio (30+40+30)/3·30
        // = 1500 + 1200 + 750 + 1000 = 4450 → 44.5
        let perf = scorer().score(
            &rate(SpeechRateQuality::Slow),
            &pauses(PauseQuality::TooRare),
            &fillers(FillerQuality::Poor),
            &audio(VolumeQuality::TooQuiet, PitchQuality::Monotone, ClarityQuality::Poor),
            &[],
        );
        assert_eq!(perf.overall_score, 44.5);
        assert_eq!(perf.level, PerformanceLevel::NeedsImprovement);
        assert_eq!(perf.weaknesses.len(), 6);
        assert_eq!(perf.weaknesses.len(), perf.suggestions.len());
        assert!(perf.strengths.is_empty());
        assert_eq!(perf.weaknesses[0], "Your speaking pace is slow.");
    }

    #[test]
    fn empty_transcript_always_adds_a_weakness() {
        let perf = scorer().score(
            &rate(SpeechRateQuality::Slow),
            &pauses(PauseQuality::Optimal),
            &fillers(FillerQuality::Excellent),
            &audio(VolumeQuality::Optimal, PitchQuality::Optimal, ClarityQuality::Excellent),
            &[AnalysisWarning::EmptyTranscript],
        );
        assert_eq!(perf.weaknesses, vec![NO_SPEECH.0.to_string()]);
        assert!(!perf.strengths.contains(&"You use very few filler words.".to_string()));
    }

    #[test]
    fn empty_transcript_does_not_reward_filler_free_silence() {
        let perf = scorer().score(
            &rate(SpeechRateQuality::Slow),
            &pauses(PauseQuality::Optimal),
            &fillers(FillerQuality::Excellent),
            &audio(VolumeQuality::Optimal, PitchQuality::Optimal, ClarityQuality::Excellent),
            &[AnalysisWarning::EmptyTranscript],
        );
        assert_eq!(perf.sub_scores.filler_words, NO_SPEECH_FILLER_SCORE);
        assert_eq!(perf.compared_to_optimal.filler_words, Comparison::Below);
        // rate 60·25 + pauses 100·20 + fillers 50·25 + audio 100·30 = 7750
        assert_eq!(perf.overall_score, 77.5);
    }

    #[test]
    fn silent_audio_replaces_audio_feedback() {
        let perf = scorer().score(
            &rate(SpeechRateQuality::Optimal),
            &pauses(PauseQuality::Indeterminate),
            &fillers(FillerQuality::Excellent),
            &audio(VolumeQuality::TooQuiet, PitchQuality::Monotone, ClarityQuality::Poor),
            &[AnalysisWarning::EmptyOrSilentAudio],
        );
        assert_eq!(perf.weaknesses, vec![NO_VOICE.0.to_string()]);
        assert_eq!(perf.compared_to_optimal.clarity, Comparison::Below);
        assert_eq!(perf.compared_to_optimal.pauses, Comparison::Below);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let weights = ScorerWeights {
            speech_rate: 50.0,
            ..ScorerWeights::default()
        };
        assert!(matches!(
            PerformanceScorer::new(weights),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn assemble_deduplicates_warnings() {
        let metrics = scorer().assemble(
            rate(SpeechRateQuality::Optimal),
            pauses(PauseQuality::Optimal),
            fillers(FillerQuality::Good),
            audio(VolumeQuality::Optimal, PitchQuality::Optimal, ClarityQuality::Good),
            vec![
                AnalysisWarning::EmptyTranscript,
                AnalysisWarning::EmptyTranscript,
            ],
        );
        assert_eq!(metrics.warnings, vec![AnalysisWarning::EmptyTranscript]);
        assert!(metrics.is_degraded());
    }

    #[test]
    fn levels() {
        assert_eq!(PerformanceLevel::from_score(85.0), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_score(84.9), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_score(50.0), PerformanceLevel::Fair);
        assert_eq!(PerformanceLevel::from_score(49.9), PerformanceLevel::NeedsImprovement);
    }
}
