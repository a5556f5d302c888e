//! Engine settings structs, defaults, validation and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every struct is `#[serde(default)]`, so a settings file only needs to name
//! the values it overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A configuration problem detected while building the engine.
///
/// These are fatal at startup, never per analysis call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Scorer weights do not add up to 100.
    #[error("scorer weights must sum to 100 (got {sum:.3})")]
    InvalidWeights { sum: f64 },

    /// A single setting is out of range or inconsistent with another.
    #[error("invalid setting `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A filler lexicon file could not be read or parsed.
    #[error("failed to load filler lexicon for `{language}` from {path}: {message}")]
    Lexicon {
        language: String,
        path: String,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Input validation, resampling and framing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Internal analysis rate in Hz; input is resampled to it.
    pub canonical_sample_rate: u32,
    /// Lowest accepted input rate.  Below this the signal is too coarse for
    /// pitch estimation.
    pub min_sample_rate: u32,
    /// Analysis window length in milliseconds.
    pub frame_ms: u32,
    /// Hop between consecutive windows in milliseconds.
    pub hop_ms: u32,
    /// Allowed disagreement between the declared duration and
    /// `samples / sample_rate`.
    pub duration_tolerance_secs: f64,
    /// How far transcript timestamps may run past the end of the audio.
    pub transcript_tolerance_secs: f64,
    /// Absolute amplitude at or above which a sample counts as clipped.
    pub clipping_threshold: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            canonical_sample_rate: 16_000,
            min_sample_rate: 8_000,
            frame_ms: 25,
            hop_ms: 10,
            duration_tolerance_secs: 0.5,
            transcript_tolerance_secs: 0.5,
            clipping_threshold: 0.99,
        }
    }
}

impl AudioConfig {
    /// Window length in samples at the canonical rate.
    pub fn frame_len(&self) -> usize {
        (self.canonical_sample_rate as usize * self.frame_ms as usize / 1000).max(1)
    }

    /// Hop length in samples at the canonical rate.
    pub fn hop_len(&self) -> usize {
        (self.canonical_sample_rate as usize * self.hop_ms as usize / 1000).max(1)
    }
}

// ---------------------------------------------------------------------------
// VadConfig
// ---------------------------------------------------------------------------

/// Adaptive energy VAD settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Fraction (0–1) of lowest-energy frames whose level defines the noise
    /// floor.
    pub noise_floor_percentile: f64,
    /// Distance in dB between the noise floor (or the peak) and the voicing
    /// threshold.
    pub margin_db: f64,
    /// The threshold never drops below this level (dBFS).
    pub absolute_floor_db: f64,
    /// Consecutive low-energy frames required before a voiced run ends.
    pub hangover_frames: usize,
    /// Unvoiced share (0–1) at which a recording counts as silent even if a
    /// click or cough crossed the threshold.
    pub silent_unvoiced_ratio: f64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            noise_floor_percentile: 0.1,
            margin_db: 10.0,
            absolute_floor_db: -60.0,
            hangover_frames: 8,
            silent_unvoiced_ratio: 0.95,
        }
    }
}

// ---------------------------------------------------------------------------
// PauseConfig
// ---------------------------------------------------------------------------

/// Pause detection and classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    /// Unvoiced intervals must be strictly longer than this to count.
    pub min_pause_secs: f64,
    /// Pauses shorter than this are `short`.
    pub short_pause_max_secs: f64,
    /// Pauses longer than this are `long`.
    pub long_pause_min_secs: f64,
    /// Below this many pauses per speaking minute the delivery is `too-rare`.
    pub min_pauses_per_minute: f64,
    /// Above this many pauses per speaking minute the delivery is
    /// `too-frequent`.
    pub max_pauses_per_minute: f64,
    /// Transcript words attached on each side of a pause.
    pub context_words: usize,
    /// Count silence before the first and after the last voiced segment.
    pub include_edge_silence: bool,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            min_pause_secs: 0.3,
            short_pause_max_secs: 0.5,
            long_pause_min_secs: 2.0,
            min_pauses_per_minute: 2.0,
            max_pauses_per_minute: 15.0,
            context_words: 4,
            include_edge_silence: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRateConfig
// ---------------------------------------------------------------------------

/// Words-per-minute quality bands.
///
/// | WPM | Quality |
/// |-----|---------|
/// | `< slow_below` | slow |
/// | `..= fast_above` | optimal |
/// | `..= very_fast_above` | fast |
/// | above | very-fast |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WpmBands {
    pub slow_below: f64,
    pub fast_above: f64,
    pub very_fast_above: f64,
}

impl Default for WpmBands {
    fn default() -> Self {
        Self {
            slow_below: 110.0,
            fast_above: 160.0,
            very_fast_above: 190.0,
        }
    }
}

/// Pacing settings.  Syllabic density differs between languages, so bands
/// can be overridden per ISO-639-1 code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechRateConfig {
    pub default_bands: WpmBands,
    pub language_bands: BTreeMap<String, WpmBands>,
    /// Window length used for the pace-variation measure.
    pub window_secs: f64,
}

impl Default for SpeechRateConfig {
    fn default() -> Self {
        Self {
            default_bands: WpmBands::default(),
            language_bands: BTreeMap::new(),
            window_secs: 10.0,
        }
    }
}

impl SpeechRateConfig {
    /// Bands for `language`, falling back to [`default_bands`](Self::default_bands).
    pub fn bands_for(&self, language: &str) -> &WpmBands {
        self.language_bands
            .get(&language.to_lowercase())
            .unwrap_or(&self.default_bands)
    }
}

// ---------------------------------------------------------------------------
// FillerConfig
// ---------------------------------------------------------------------------

/// Filler-word detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// Lexicon used when the transcript language has none.
    pub default_language: String,
    /// Extra lexicon JSON files keyed by language code.  Entries extend (and
    /// override) the built-in lexicon for that language.
    pub lexicon_paths: BTreeMap<String, PathBuf>,
    /// Subtracted from every confidence when the fallback lexicon is used.
    pub unknown_language_penalty: f64,
    /// Candidates below this confidence are not reported.
    pub min_confidence: f64,
    /// Normalised Levenshtein similarity required for a fuzzy match.
    pub fuzzy_similarity: f64,
    /// Transcript words on each side included in a filler's context string.
    pub context_words: usize,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            default_language: "en".into(),
            lexicon_paths: BTreeMap::new(),
            unknown_language_penalty: 0.2,
            min_confidence: 0.4,
            fuzzy_similarity: 0.75,
            context_words: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioQualityConfig
// ---------------------------------------------------------------------------

/// Average voiced loudness bands in dBFS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBands {
    pub too_quiet_below: f64,
    pub quiet_below: f64,
    pub loud_above: f64,
    pub too_loud_above: f64,
    /// Standard deviation (dB) that maps to a consistency of 0.
    pub consistency_spread_db: f64,
}

impl Default for VolumeBands {
    fn default() -> Self {
        Self {
            too_quiet_below: -40.0,
            quiet_below: -30.0,
            loud_above: -12.0,
            too_loud_above: -6.0,
            consistency_spread_db: 20.0,
        }
    }
}

/// Pitch tracking range and variation bands (standard deviation in Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchBands {
    pub min_hz: f64,
    pub max_hz: f64,
    /// Normalised autocorrelation peak required to accept an F0 estimate.
    pub voicing_threshold: f64,
    pub monotone_below_hz: f64,
    pub low_variation_below_hz: f64,
    pub high_variation_above_hz: f64,
}

impl Default for PitchBands {
    fn default() -> Self {
        Self {
            min_hz: 75.0,
            max_hz: 400.0,
            voicing_threshold: 0.5,
            monotone_below_hz: 15.0,
            low_variation_below_hz: 25.0,
            high_variation_above_hz: 60.0,
        }
    }
}

/// SNR bands in dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClarityBands {
    pub fair_min_db: f64,
    pub good_min_db: f64,
    pub excellent_min_db: f64,
    /// Noise level assumed when the recording has no unvoiced frames.
    pub default_noise_floor_dbfs: f64,
    /// Upper clamp for the reported SNR.
    pub max_snr_db: f64,
}

impl Default for ClarityBands {
    fn default() -> Self {
        Self {
            fair_min_db: 10.0,
            good_min_db: 20.0,
            excellent_min_db: 30.0,
            default_noise_floor_dbfs: -60.0,
            max_snr_db: 60.0,
        }
    }
}

/// Audio-quality analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioQualityConfig {
    pub volume: VolumeBands,
    pub pitch: PitchBands,
    pub clarity: ClarityBands,
    /// Fraction of clipped samples above which a clipping advisory replaces
    /// the recommendation.
    pub max_clipping_ratio: f64,
    /// Estimate F0 on every n-th voiced frame.  `1` tracks every voiced frame;
    /// larger values trade pitch resolution for speed on long recordings.
    pub pitch_frame_stride: usize,
}

impl Default for AudioQualityConfig {
    fn default() -> Self {
        Self {
            volume: VolumeBands::default(),
            pitch: PitchBands::default(),
            clarity: ClarityBands::default(),
            max_clipping_ratio: 0.01,
            pitch_frame_stride: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// ScorerConfig
// ---------------------------------------------------------------------------

/// Relative weight (percent) of each dimension in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerWeights {
    pub speech_rate: f64,
    pub pauses: f64,
    pub filler_words: f64,
    pub audio_quality: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            speech_rate: 25.0,
            pauses: 20.0,
            filler_words: 25.0,
            audio_quality: 30.0,
        }
    }
}

impl ScorerWeights {
    pub fn sum(&self) -> f64 {
        self.speech_rate + self.pauses + self.filler_words + self.audio_quality
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub weights: ScorerWeights,
}

// ---------------------------------------------------------------------------
// AnalyticsConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level engine configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use speech_analytics::config::AnalyticsConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AnalyticsConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub audio: AudioConfig,
    pub vad: VadConfig,
    pub pause: PauseConfig,
    pub speech_rate: SpeechRateConfig,
    pub filler: FillerConfig,
    pub audio_quality: AudioQualityConfig,
    pub scorer: ScorerConfig,
}

impl AnalyticsConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AnalyticsConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every setting the analyzers rely on.
    ///
    /// Scorer weights must sum to exactly 100; they are never renormalised.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.scorer.weights;
        let sum = w.sum();
        let any_negative = [w.speech_rate, w.pauses, w.filler_words, w.audio_quality]
            .iter()
            .any(|v| *v < 0.0 || !v.is_finite());
        if any_negative || (sum - 100.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidWeights { sum });
        }

        let a = &self.audio;
        if a.min_sample_rate == 0 || a.canonical_sample_rate < a.min_sample_rate {
            return Err(ConfigError::invalid(
                "audio.canonical_sample_rate",
                format!(
                    "must be >= min_sample_rate ({}) and non-zero",
                    a.min_sample_rate
                ),
            ));
        }
        if a.frame_ms == 0 || a.hop_ms == 0 || a.hop_ms > a.frame_ms {
            return Err(ConfigError::invalid(
                "audio.hop_ms",
                "frame_ms and hop_ms must be > 0 with hop_ms <= frame_ms",
            ));
        }

        if !(0.0..=1.0).contains(&self.vad.noise_floor_percentile) {
            return Err(ConfigError::invalid(
                "vad.noise_floor_percentile",
                "must be within [0, 1]",
            ));
        }
        if !(self.vad.silent_unvoiced_ratio > 0.0 && self.vad.silent_unvoiced_ratio <= 1.0) {
            return Err(ConfigError::invalid(
                "vad.silent_unvoiced_ratio",
                "must be within (0, 1]",
            ));
        }

        let p = &self.pause;
        if p.min_pause_secs <= 0.0 {
            return Err(ConfigError::invalid("pause.min_pause_secs", "must be > 0"));
        }
        if p.short_pause_max_secs > p.long_pause_min_secs {
            return Err(ConfigError::invalid(
                "pause.short_pause_max_secs",
                "must not exceed long_pause_min_secs",
            ));
        }
        if p.min_pauses_per_minute > p.max_pauses_per_minute {
            return Err(ConfigError::invalid(
                "pause.min_pauses_per_minute",
                "must not exceed max_pauses_per_minute",
            ));
        }

        let bands = std::iter::once(&self.speech_rate.default_bands)
            .chain(self.speech_rate.language_bands.values());
        for b in bands {
            if !(b.slow_below <= b.fast_above && b.fast_above <= b.very_fast_above) {
                return Err(ConfigError::invalid(
                    "speech_rate.bands",
                    "expected slow_below <= fast_above <= very_fast_above",
                ));
            }
        }
        if self.speech_rate.window_secs <= 0.0 {
            return Err(ConfigError::invalid("speech_rate.window_secs", "must be > 0"));
        }

        let f = &self.filler;
        if !(0.0..=1.0).contains(&f.min_confidence)
            || !(0.0..=1.0).contains(&f.unknown_language_penalty)
            || !(0.0..=1.0).contains(&f.fuzzy_similarity)
        {
            return Err(ConfigError::invalid(
                "filler",
                "min_confidence, unknown_language_penalty and fuzzy_similarity must be within [0, 1]",
            ));
        }

        let v = &self.audio_quality.volume;
        if !(v.too_quiet_below <= v.quiet_below
            && v.quiet_below <= v.loud_above
            && v.loud_above <= v.too_loud_above)
            || v.consistency_spread_db <= 0.0
        {
            return Err(ConfigError::invalid(
                "audio_quality.volume",
                "bands must be ascending and consistency_spread_db > 0",
            ));
        }
        let pb = &self.audio_quality.pitch;
        if !(pb.min_hz > 0.0 && pb.min_hz < pb.max_hz)
            || !(pb.monotone_below_hz <= pb.low_variation_below_hz
                && pb.low_variation_below_hz <= pb.high_variation_above_hz)
        {
            return Err(ConfigError::invalid(
                "audio_quality.pitch",
                "expected 0 < min_hz < max_hz and ascending variation bands",
            ));
        }
        if pb.max_hz * 2.0 > a.canonical_sample_rate as f64 {
            return Err(ConfigError::invalid(
                "audio_quality.pitch.max_hz",
                "must be below the Nyquist frequency of the canonical rate",
            ));
        }
        if self.audio_quality.pitch_frame_stride == 0 {
            return Err(ConfigError::invalid(
                "audio_quality.pitch_frame_stride",
                "must be at least 1",
            ));
        }
        let c = &self.audio_quality.clarity;
        if !(c.fair_min_db <= c.good_min_db
            && c.good_min_db <= c.excellent_min_db
            && c.excellent_min_db <= c.max_snr_db)
        {
            return Err(ConfigError::invalid(
                "audio_quality.clarity",
                "bands must be ascending and below max_snr_db",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AnalyticsConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AnalyticsConfig::load_from(&path).expect("load");

        assert_eq!(
            original.audio.canonical_sample_rate,
            loaded.audio.canonical_sample_rate
        );
        assert_eq!(original.vad.hangover_frames, loaded.vad.hangover_frames);
        assert_eq!(original.pause.min_pause_secs, loaded.pause.min_pause_secs);
        assert_eq!(
            original.speech_rate.default_bands,
            loaded.speech_rate.default_bands
        );
        assert_eq!(
            original.filler.default_language,
            loaded.filler.default_language
        );
        assert_eq!(original.audio_quality.pitch, loaded.audio_quality.pitch);
        assert_eq!(original.scorer.weights, loaded.scorer.weights);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AnalyticsConfig::load_from(&path).expect("should not error");
        assert_eq!(config.audio.canonical_sample_rate, 16_000);
        assert_eq!(config.scorer.weights, ScorerWeights::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[pause]\nmin_pause_secs = 0.5\n").unwrap();

        let cfg = AnalyticsConfig::load_from(&path).expect("load");
        assert_eq!(cfg.pause.min_pause_secs, 0.5);
        assert_eq!(cfg.pause.context_words, 4);
        assert_eq!(cfg.audio.hop_ms, 10);
    }

    #[test]
    fn default_values() {
        let cfg = AnalyticsConfig::default();

        assert_eq!(cfg.audio.frame_len(), 400);
        assert_eq!(cfg.audio.hop_len(), 160);
        assert_eq!(cfg.speech_rate.default_bands.slow_below, 110.0);
        assert_eq!(cfg.speech_rate.default_bands.fast_above, 160.0);
        assert_eq!(cfg.speech_rate.default_bands.very_fast_above, 190.0);
        assert_eq!(cfg.scorer.weights.sum(), 100.0);
        assert_eq!(cfg.audio_quality.pitch_frame_stride, 1);
        assert_eq!(cfg.vad.silent_unvoiced_ratio, 0.95);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn silent_ratio_outside_unit_interval_is_rejected() {
        for ratio in [0.0, 1.5] {
            let mut cfg = AnalyticsConfig::default();
            cfg.vad.silent_unvoiced_ratio = ratio;
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidValue { field: "vad.silent_unvoiced_ratio", .. })
            ));
        }
    }

    #[test]
    fn weights_not_summing_to_100_are_rejected() {
        let mut cfg = AnalyticsConfig::default();
        cfg.scorer.weights.pauses = 30.0;
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidWeights { sum: 110.0 }
        );
    }

    #[test]
    fn negative_weight_is_rejected_even_if_sum_matches() {
        let mut cfg = AnalyticsConfig::default();
        cfg.scorer.weights.pauses = -10.0;
        cfg.scorer.weights.audio_quality = 60.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn unordered_wpm_bands_are_rejected() {
        let mut cfg = AnalyticsConfig::default();
        cfg.speech_rate.language_bands.insert(
            "it".into(),
            WpmBands {
                slow_below: 200.0,
                fast_above: 150.0,
                very_fast_above: 220.0,
            },
        );
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("speech_rate.bands"), "{err}");
    }

    #[test]
    fn hop_longer_than_frame_is_rejected() {
        let mut cfg = AnalyticsConfig::default();
        cfg.audio.hop_ms = 40;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "audio.hop_ms", .. })
        ));
    }

    #[test]
    fn bands_for_language_falls_back_to_default() {
        let mut cfg = SpeechRateConfig::default();
        let it = WpmBands {
            slow_below: 120.0,
            fast_above: 170.0,
            very_fast_above: 200.0,
        };
        cfg.language_bands.insert("it".into(), it);

        assert_eq!(cfg.bands_for("IT"), &it);
        assert_eq!(cfg.bands_for("de"), &WpmBands::default());
    }
}
