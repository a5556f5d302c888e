//! The terminal analysis artifact and its cache key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::{
    AnalysisWarning, AudioQualityMetrics, FillerWordsAnalysis, PauseAnalysis, SpeakingPerformance,
    SpeechRateMetrics,
};
use crate::audio::RecordedAudio;
use crate::transcript::Transcript;

// ---------------------------------------------------------------------------
// AudioMetrics
// ---------------------------------------------------------------------------

/// Everything the engine measured for one (audio, transcript) pair.
///
/// Built once by [`PerformanceScorer::assemble`](crate::analysis::PerformanceScorer::assemble)
/// and never mutated.  Serialises to camelCase JSON with kebab-case enum
/// values; map-valued fields are ordered, so equal reports produce identical
/// bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetrics {
    pub speech_rate: SpeechRateMetrics,
    pub pause_analysis: PauseAnalysis,
    pub filler_words: FillerWordsAnalysis,
    pub audio_quality: AudioQualityMetrics,
    pub speaking_performance: SpeakingPerformance,
    /// Degraded-input advisories, in the order the stages raised them.
    #[serde(default)]
    pub warnings: Vec<AnalysisWarning>,
}

impl AudioMetrics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AnalysisKey
// ---------------------------------------------------------------------------

/// SHA-256 digests identifying an (audio, transcript) pair.
///
/// Callers that persist reports can key them by this pair; the engine itself
/// keeps nothing between calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisKey {
    pub audio: String,
    pub transcript: String,
}

impl AnalysisKey {
    pub fn new(audio: &RecordedAudio, transcript: &Transcript) -> serde_json::Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(audio.sample_rate.to_le_bytes());
        for s in &audio.samples {
            hasher.update(s.to_le_bytes());
        }
        let audio_hash = format!("{:x}", hasher.finalize());

        let canonical = serde_json::to_vec(transcript)?;
        let transcript_hash = format!("{:x}", Sha256::digest(&canonical));

        Ok(Self {
            audio: audio_hash,
            transcript: transcript_hash,
        })
    }
}

impl std::fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short = |h: &str| h.chars().take(12).collect::<String>();
        write!(f, "{}:{}", short(&self.audio), short(&self.transcript))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptWord;

    fn transcript(word: &str) -> Transcript {
        Transcript::new("en", vec![TranscriptWord::new(word, 0.0, 0.4)])
    }

    #[test]
    fn key_is_stable_and_hex() {
        let audio = RecordedAudio::new(vec![0.1, -0.2, 0.3], 16_000);
        let a = AnalysisKey::new(&audio, &transcript("hello")).unwrap();
        let b = AnalysisKey::new(&audio, &transcript("hello")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.audio.len(), 64);
        assert!(a.audio.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_changes_with_inputs() {
        let audio = RecordedAudio::new(vec![0.1, -0.2, 0.3], 16_000);
        let base = AnalysisKey::new(&audio, &transcript("hello")).unwrap();

        let other_word = AnalysisKey::new(&audio, &transcript("world")).unwrap();
        assert_eq!(base.audio, other_word.audio);
        assert_ne!(base.transcript, other_word.transcript);

        let resampled = RecordedAudio::new(vec![0.1, -0.2, 0.3], 22_050);
        let other_rate = AnalysisKey::new(&resampled, &transcript("hello")).unwrap();
        assert_ne!(base.audio, other_rate.audio);
    }

    #[test]
    fn display_is_abbreviated() {
        let audio = RecordedAudio::new(vec![0.0; 8], 16_000);
        let key = AnalysisKey::new(&audio, &transcript("hi")).unwrap();
        assert_eq!(key.to_string().len(), 25);
    }
}
