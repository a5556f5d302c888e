//! Words-per-minute, articulation rate and pacing consistency.
//!
//! * `wordsPerMinute` counts every word against the full recording.
//! * `articulation.rate` counts them against speaking time only (recording
//!   minus pauses), so a speaker who talks fast but pauses a lot shows up.
//! * `paceVariation` is the coefficient of variation (%) of WPM measured in
//!   consecutive fixed windows.

use serde::{Deserialize, Serialize};

use crate::config::{SpeechRateConfig, WpmBands};
use crate::transcript::Transcript;

use super::{AnalysisWarning, StageOutput};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechRateQuality {
    Slow,
    Optimal,
    Fast,
    VeryFast,
}

impl SpeechRateQuality {
    pub fn from_wpm(wpm: f64, bands: &WpmBands) -> Self {
        if wpm < bands.slow_below {
            Self::Slow
        } else if wpm <= bands.fast_above {
            Self::Optimal
        } else if wpm <= bands.very_fast_above {
            Self::Fast
        } else {
            Self::VeryFast
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Slow => {
                "Your pace is on the slow side. Try tightening transitions and \
                 trimming long hesitations to keep listeners engaged."
            }
            Self::Optimal => {
                "Your pace is in the comfortable range for listeners. Keep it up."
            }
            Self::Fast => {
                "You are speaking slightly fast. Slow down at key points and let \
                 important ideas land."
            }
            Self::VeryFast => {
                "You are speaking very fast. Breathe between sentences and add \
                 deliberate pauses so listeners can keep up."
            }
        }
    }
}

const NO_SPEECH_RECOMMENDATION: &str =
    "No speech detected in the transcript. Check the recording and transcription before \
     analysing pace.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticulationMetrics {
    /// Words per minute of speaking time.
    pub rate: f64,
    pub speaking_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRateMetrics {
    pub words_per_minute: f64,
    pub total_words: usize,
    pub total_duration_secs: f64,
    pub articulation: ArticulationMetrics,
    /// Coefficient of variation (%) of per-window WPM; 0 with fewer than two
    /// full windows.
    pub pace_variation: f64,
    pub quality: SpeechRateQuality,
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
// SpeechRateAnalyzer
// ---------------------------------------------------------------------------

pub struct SpeechRateAnalyzer {
    config: SpeechRateConfig,
}

impl SpeechRateAnalyzer {
    pub fn new(config: SpeechRateConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        transcript: &Transcript,
        total_duration_secs: f64,
        total_pause_secs: f64,
    ) -> StageOutput<SpeechRateMetrics> {
        let words = transcript.word_count();

        if words == 0 || total_duration_secs <= 0.0 {
            log::warn!("speech_rate: no words to measure");
            return StageOutput::clean(SpeechRateMetrics {
                words_per_minute: 0.0,
                total_words: words,
                total_duration_secs: total_duration_secs.max(0.0),
                articulation: ArticulationMetrics {
                    rate: 0.0,
                    speaking_time_secs: 0.0,
                },
                pace_variation: 0.0,
                quality: SpeechRateQuality::Slow,
                recommendation: NO_SPEECH_RECOMMENDATION.to_string(),
            })
            .with_warning(AnalysisWarning::EmptyTranscript);
        }

        let words_per_minute = words as f64 / (total_duration_secs / 60.0);

        let speaking_time_secs = (total_duration_secs - total_pause_secs).max(0.0);
        let articulation_rate = if speaking_time_secs > 0.0 {
            words as f64 / (speaking_time_secs / 60.0)
        } else {
            0.0
        };

        let bands = self.config.bands_for(&transcript.primary_language());
        let quality = SpeechRateQuality::from_wpm(words_per_minute, bands);
        let pace_variation = self.pace_variation(transcript);

        log::debug!(
            "speech_rate: {words} words, {words_per_minute:.1} wpm, articulation \
             {articulation_rate:.1}, variation {pace_variation:.1}% → {quality:?}"
        );

        StageOutput::clean(SpeechRateMetrics {
            words_per_minute,
            total_words: words,
            total_duration_secs,
            articulation: ArticulationMetrics {
                rate: articulation_rate,
                speaking_time_secs,
            },
            pace_variation,
            quality,
            recommendation: quality.recommendation().to_string(),
        })
    }

    /// Coefficient of variation (%) of WPM over consecutive full windows
    /// starting at the first word.
    fn pace_variation(&self, transcript: &Transcript) -> f64 {
        let window = self.config.window_secs;
        let words: Vec<f64> = transcript
            .words
            .iter()
            .filter(|w| !w.word.trim().is_empty())
            .map(|w| w.start_time)
            .collect();
        let Some(&first) = words.first() else {
            return 0.0;
        };
        let last_end = transcript.last_end_time();

        let full_windows = ((last_end - first) / window).floor() as usize;
        if full_windows < 2 {
            return 0.0;
        }

        let mut counts = vec![0_usize; full_windows];
        for start in &words {
            let slot = ((start - first) / window).floor() as usize;
            if let Some(c) = counts.get_mut(slot) {
                *c += 1;
            }
        }

        let rates: Vec<f64> = counts.iter().map(|&c| c as f64 * 60.0 / window).collect();
        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        if mean <= 0.0 {
            return 0.0;
        }
        let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / rates.len() as f64;
        variance.sqrt() / mean * 100.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::transcript::TranscriptWord;

    /// `count` words evenly spread over `secs` seconds.
    fn even_transcript(language: &str, count: usize, secs: f64) -> Transcript {
        let step = secs / count as f64;
        let words = (0..count)
            .map(|i| {
                let start = i as f64 * step;
                TranscriptWord::new(format!("w{i}"), start, start + step * 0.8)
            })
            .collect();
        Transcript::new(language, words)
    }

    fn analyzer() -> SpeechRateAnalyzer {
        SpeechRateAnalyzer::new(SpeechRateConfig::default())
    }

    #[test]
    fn buckets_follow_bands() {
        let b = WpmBands::default();
        assert_eq!(SpeechRateQuality::from_wpm(90.0, &b), SpeechRateQuality::Slow);
        assert_eq!(SpeechRateQuality::from_wpm(110.0, &b), SpeechRateQuality::Optimal);
        assert_eq!(SpeechRateQuality::from_wpm(160.0, &b), SpeechRateQuality::Optimal);
        assert_eq!(SpeechRateQuality::from_wpm(175.0, &b), SpeechRateQuality::Fast);
        assert_eq!(SpeechRateQuality::from_wpm(220.0, &b), SpeechRateQuality::VeryFast);
    }

    #[test]
    fn wpm_and_articulation() {
        let out = analyzer().analyze(&even_transcript("en", 150, 60.0), 60.0, 6.0);
        let m = out.report;
        assert!(out.warnings.is_empty());
        assert!((m.words_per_minute - 150.0).abs() < 1e-9);
        assert!((m.articulation.rate - 150.0 / 0.9).abs() < 1e-9);
        assert!((m.articulation.speaking_time_secs - 54.0).abs() < 1e-9);
        assert_eq!(m.quality, SpeechRateQuality::Optimal);
    }

    #[test]
    fn even_pace_has_low_variation() {
        let m = analyzer().analyze(&even_transcript("en", 150, 60.0), 60.0, 0.0).report;
        assert!(m.pace_variation < 5.0, "{}", m.pace_variation);
    }

    #[test]
    fn uneven_pace_has_high_variation() {
        // 40 words crammed into the first 10 s, 10 words in the next 10 s
        // (the 11th starts the incomplete third window and is ignored).
        let mut words = Vec::new();
        for i in 0..40 {
            let s = i as f64 * 0.25;
            words.push(TranscriptWord::new("fast", s, s + 0.2));
        }
        for i in 0..11 {
            let s = 10.0 + i as f64;
            words.push(TranscriptWord::new("slow", s, s + 0.5));
        }
        let m = analyzer()
            .analyze(&Transcript::new("en", words), 21.0, 0.0)
            .report;
        assert!(m.pace_variation > 50.0, "{}", m.pace_variation);
    }

    #[test]
    fn zero_words_yield_zeroed_report_and_warning() {
        let out = analyzer().analyze(&Transcript::new("en", Vec::new()), 30.0, 0.0);
        assert_eq!(out.report.words_per_minute, 0.0);
        assert_eq!(out.report.articulation.rate, 0.0);
        assert_eq!(out.report.quality, SpeechRateQuality::Slow);
        assert!(out.report.recommendation.contains("No speech detected"));
        assert_eq!(out.warnings, vec![AnalysisWarning::EmptyTranscript]);
    }

    #[test]
    fn all_pause_recording_has_zero_articulation() {
        let m = analyzer().analyze(&even_transcript("en", 10, 10.0), 10.0, 10.0).report;
        assert_eq!(m.articulation.rate, 0.0);
        assert!(m.words_per_minute > 0.0);
    }

    #[test]
    fn language_bands_override_default() {
        let mut language_bands = BTreeMap::new();
        language_bands.insert(
            "it".to_string(),
            WpmBands {
                slow_below: 130.0,
                fast_above: 180.0,
                very_fast_above: 210.0,
            },
        );
        let a = SpeechRateAnalyzer::new(SpeechRateConfig {
            language_bands,
            ..SpeechRateConfig::default()
        });
        let it = a.analyze(&even_transcript("it-IT", 120, 60.0), 60.0, 0.0).report;
        let en = a.analyze(&even_transcript("en", 120, 60.0), 60.0, 0.0).report;
        assert_eq!(it.quality, SpeechRateQuality::Slow);
        assert_eq!(en.quality, SpeechRateQuality::Optimal);
    }

    #[test]
    fn same_bucket_same_recommendation() {
        let a = analyzer().analyze(&even_transcript("en", 120, 60.0), 60.0, 0.0).report;
        let b = analyzer().analyze(&even_transcript("en", 150, 60.0), 60.0, 0.0).report;
        assert_eq!(a.recommendation, b.recommendation);
    }
}
