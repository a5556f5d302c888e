//! Filler-word detection.
//!
//! Each transcript word (or run of words, for phrase entries) is matched
//! against the lexicon for the transcript language, strongest rule first:
//!
//! | Match | Strength |
//! |-------|----------|
//! | exact phrase / exact word | 1.0 |
//! | repeated letters collapsed (`"ehmmm"` → `"ehm"`) | 0.9 |
//! | fuzzy, short hesitation-shaped tokens (`strsim`) | similarity × 0.8 |
//!
//! Confidence starts from the entry kind's base and the match strength, then
//! silence around the token raises it and a discourse marker buried in fluent
//! speech lowers it.  Candidates under `min_confidence` are dropped; the
//! unknown-language penalty is applied to the survivors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::FillerConfig;
use crate::transcript::{Transcript, TranscriptWord};

use super::lexicon::{normalize_token, CompiledEntry, FillerKind, FillerLexicon, LexiconSet};
use super::{AnalysisWarning, StageOutput};

const HESITATION_BASE: f64 = 0.85;
const DISCOURSE_BASE: f64 = 0.55;
const COLLAPSED_STRENGTH: f64 = 0.9;
const FUZZY_STRENGTH: f64 = 0.8;

/// Inter-word silence that counts as a gap around a filler.
const GAP_SECS: f64 = 0.25;
const HESITATION_GAP_BONUS: f64 = 0.075;
const DISCOURSE_GAP_BONUS: f64 = 0.1;
/// Multiplier for a discourse marker with no gap on either side.
const FLUENT_DISCOURSE_FACTOR: f64 = 0.6;
/// Per extra character when a fuzzy match is longer than its entry.
const EMBEDDED_PENALTY_PER_CHAR: f64 = 0.05;
const EMBEDDED_PENALTY_MAX: f64 = 0.2;

/// Longest token considered for fuzzy matching.
const FUZZY_MAX_LEN: usize = 6;
/// Characters a vocalised hesitation is made of.
const HESITATION_CHARS: &str = "aehimnoruàèéìòùäö";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillerQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FillerQuality {
    /// Bucket a filler rate (fillers per 100 words).
    pub fn from_rate(rate: f64) -> Self {
        if rate < 2.0 {
            Self::Excellent
        } else if rate <= 5.0 {
            Self::Good
        } else if rate <= 10.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => "Filler words are rare in your speech. Well done.",
            Self::Good => {
                "Filler words are occasional. Replacing them with a short silent pause \
                 will make you sound even more confident."
            }
            Self::Fair => {
                "Filler words are noticeable. Practise pausing silently when you need \
                 time to think instead of filling the gap."
            }
            Self::Poor => {
                "Filler words are frequent and distract from your message. Rehearse key \
                 passages and consciously replace fillers with brief pauses."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFiller {
    /// The word(s) as they appear in the transcript.
    pub word: String,
    /// Lexicon form the word matched; the `byType` key.
    pub normalized: String,
    pub kind: FillerKind,
    /// Start time of the (first) word, in seconds.
    pub timestamp: f64,
    pub confidence: f64,
    /// Surrounding transcript words.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillerWordsAnalysis {
    pub total_count: usize,
    /// Fillers per 100 words.
    pub filler_rate: f64,
    pub fillers_per_minute: f64,
    pub by_type: BTreeMap<String, usize>,
    /// Most frequent filler; ties go to the alphabetically first.
    pub most_common: Option<String>,
    pub quality: FillerQuality,
    pub recommendation: String,
    /// Language of the lexicon that was used.
    pub lexicon_language: String,
    pub detected_fillers: Vec<DetectedFiller>,
}

// ---------------------------------------------------------------------------
// FillerDetector
// ---------------------------------------------------------------------------

/// Outcome of matching one position in the transcript.
struct Candidate<'l> {
    entry: &'l CompiledEntry,
    strength: f64,
    /// Words consumed.
    span: usize,
    /// Extra characters beyond the entry form (fuzzy matches only).
    excess_chars: usize,
}

pub struct FillerDetector {
    config: FillerConfig,
    lexicons: Arc<LexiconSet>,
}

impl FillerDetector {
    pub fn new(config: FillerConfig, lexicons: Arc<LexiconSet>) -> Self {
        Self { config, lexicons }
    }

    pub fn analyze(
        &self,
        transcript: &Transcript,
        total_duration_secs: f64,
    ) -> StageOutput<FillerWordsAnalysis> {
        let resolution = self.lexicons.resolve(&transcript.language);
        let lexicon = resolution.lexicon();
        let penalty = if resolution.is_fallback() {
            self.config.unknown_language_penalty
        } else {
            0.0
        };

        let detected = self.detect(transcript, lexicon, penalty);

        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        for f in &detected {
            *by_type.entry(f.normalized.clone()).or_insert(0) += 1;
        }
        let most_common = by_type
            .iter()
            .fold(None::<(&String, usize)>, |best, (token, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((token, count)),
            })
            .map(|(token, _)| token.clone());

        let words = transcript.word_count();
        let total_count = detected.len();
        let filler_rate = if words == 0 {
            0.0
        } else {
            total_count as f64 / words as f64 * 100.0
        };
        let fillers_per_minute = if total_duration_secs > 0.0 {
            total_count as f64 / (total_duration_secs / 60.0)
        } else {
            0.0
        };
        let quality = FillerQuality::from_rate(filler_rate);

        log::debug!(
            "filler: {total_count} fillers in {words} words ({filler_rate:.1}%) using `{}` lexicon → {quality:?}",
            lexicon.language()
        );

        let report = FillerWordsAnalysis {
            total_count,
            filler_rate,
            fillers_per_minute,
            by_type,
            most_common,
            quality,
            recommendation: quality.recommendation().to_string(),
            lexicon_language: lexicon.language().to_string(),
            detected_fillers: detected,
        };

        if resolution.is_fallback() {
            log::warn!(
                "filler: no lexicon for `{}`, using `{}`",
                transcript.language,
                lexicon.language()
            );
            StageOutput::clean(report).with_warning(AnalysisWarning::UnknownLanguage {
                requested: transcript.language.clone(),
                fallback: lexicon.language().to_string(),
            })
        } else {
            StageOutput::clean(report)
        }
    }

    fn detect(
        &self,
        transcript: &Transcript,
        lexicon: &FillerLexicon,
        penalty: f64,
    ) -> Vec<DetectedFiller> {
        let words = &transcript.words;
        let normalized: Vec<String> = words.iter().map(|w| normalize_token(&w.word)).collect();
        let phrases = lexicon.phrases();

        let mut detected = Vec::new();
        let mut i = 0;
        while i < words.len() {
            if normalized[i].is_empty() {
                i += 1;
                continue;
            }
            let Some(candidate) = self.match_at(i, &normalized, lexicon, &phrases) else {
                i += 1;
                continue;
            };

            let last = i + candidate.span - 1;
            let confidence = self.confidence(&candidate, words, i, last);
            if confidence >= self.config.min_confidence {
                detected.push(DetectedFiller {
                    word: words[i..=last]
                        .iter()
                        .map(|w| w.word.trim())
                        .collect::<Vec<_>>()
                        .join(" "),
                    normalized: candidate.entry.canonical.clone(),
                    kind: candidate.entry.kind,
                    timestamp: words[i].start_time,
                    confidence: (confidence - penalty).clamp(0.0, 1.0),
                    context: transcript.context_around(i, self.config.context_words),
                });
                i = last + 1;
            } else {
                i += 1;
            }
        }
        detected
    }

    fn match_at<'l>(
        &self,
        i: usize,
        normalized: &[String],
        lexicon: &'l FillerLexicon,
        phrases: &[&'l CompiledEntry],
    ) -> Option<Candidate<'l>> {
        for phrase in phrases {
            let n = phrase.words.len();
            if i + n <= normalized.len() && normalized[i..i + n] == phrase.words[..] {
                return Some(Candidate {
                    entry: phrase,
                    strength: 1.0,
                    span: n,
                    excess_chars: 0,
                });
            }
        }

        let token = normalized[i].as_str();
        if let Some(entry) = lexicon.exact(token) {
            return Some(Candidate {
                entry,
                strength: 1.0,
                span: 1,
                excess_chars: 0,
            });
        }
        if let Some(entry) = lexicon.collapsed(token) {
            return Some(Candidate {
                entry,
                strength: COLLAPSED_STRENGTH,
                span: 1,
                excess_chars: 0,
            });
        }
        self.fuzzy(token, lexicon)
    }

    /// Best fuzzy match among single-word hesitations.
    fn fuzzy<'l>(&self, token: &str, lexicon: &'l FillerLexicon) -> Option<Candidate<'l>> {
        let len = token.chars().count();
        if len > FUZZY_MAX_LEN || !token.chars().all(|c| HESITATION_CHARS.contains(c)) {
            return None;
        }

        let mut best: Option<(&CompiledEntry, f64)> = None;
        for entry in lexicon.entries() {
            if entry.is_phrase() || entry.kind != FillerKind::Hesitation {
                continue;
            }
            let entry_len = entry.canonical.chars().count();
            if len.abs_diff(entry_len) > 1 {
                continue;
            }
            let similarity = strsim::normalized_levenshtein(token, &entry.canonical);
            if similarity >= self.config.fuzzy_similarity
                && best.map_or(true, |(_, s)| similarity > s)
            {
                best = Some((entry, similarity));
            }
        }

        best.map(|(entry, similarity)| Candidate {
            entry,
            strength: similarity * FUZZY_STRENGTH,
            span: 1,
            excess_chars: len.saturating_sub(entry.canonical.chars().count()),
        })
    }

    fn confidence(
        &self,
        candidate: &Candidate<'_>,
        words: &[TranscriptWord],
        first: usize,
        last: usize,
    ) -> f64 {
        let gap_before = first
            .checked_sub(1)
            .map(|p| words[first].start_time - words[p].end_time >= GAP_SECS)
            .unwrap_or(false);
        let gap_after = words
            .get(last + 1)
            .map(|n| n.start_time - words[last].end_time >= GAP_SECS)
            .unwrap_or(false);
        let gaps = gap_before as u8 + gap_after as u8;

        let mut confidence = match candidate.entry.kind {
            FillerKind::Hesitation => {
                HESITATION_BASE * candidate.strength + HESITATION_GAP_BONUS * gaps as f64
            }
            FillerKind::DiscourseMarker if gaps == 0 => {
                DISCOURSE_BASE * candidate.strength * FLUENT_DISCOURSE_FACTOR
            }
            FillerKind::DiscourseMarker => {
                DISCOURSE_BASE * candidate.strength + DISCOURSE_GAP_BONUS * gaps as f64
            }
        };

        confidence -= (candidate.excess_chars as f64 * EMBEDDED_PENALTY_PER_CHAR)
            .min(EMBEDDED_PENALTY_MAX);
        confidence.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Words 0.4 s apart with 0.1 s gaps, i.e. fluent speech.
    fn fluent(language: &str, words: &[&str]) -> Transcript {
        let words = words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let start = i as f64 * 0.4;
                TranscriptWord::new(*w, start, start + 0.3)
            })
            .collect();
        Transcript::new(language, words)
    }

    fn detector() -> FillerDetector {
        let lexicons = LexiconSet::builtin("en").unwrap();
        FillerDetector::new(FillerConfig::default(), Arc::new(lexicons))
    }

    fn analyze(t: &Transcript) -> StageOutput<FillerWordsAnalysis> {
        detector().analyze(t, t.last_end_time())
    }

    #[test]
    fn exact_hesitation_is_detected() {
        let out = analyze(&fluent("en", &["so", "ehm", "we", "start"]));
        let r = out.report;
        assert!(out.warnings.is_empty());
        assert_eq!(r.total_count, 1);
        let f = &r.detected_fillers[0];
        assert_eq!(f.normalized, "ehm");
        assert_eq!(f.kind, FillerKind::Hesitation);
        assert!((f.timestamp - 0.4).abs() < 1e-9);
        assert!((f.confidence - HESITATION_BASE).abs() < 1e-9);
        assert_eq!(f.context, "so ehm we start");
    }

    #[test]
    fn elongated_hesitation_collapses() {
        let r = analyze(&fluent("it", &["allora", "ehmmm", "vediamo"])).report;
        let f = r
            .detected_fillers
            .iter()
            .find(|f| f.word == "ehmmm")
            .unwrap();
        assert_eq!(f.normalized, "ehm");
        assert!((f.confidence - HESITATION_BASE * COLLAPSED_STRENGTH).abs() < 1e-9);
    }

    #[test]
    fn fuzzy_match_catches_misspelled_hesitation() {
        let r = analyze(&fluent("en", &["we", "ehem", "start"])).report;
        assert_eq!(r.total_count, 1);
        let f = &r.detected_fillers[0];
        assert_eq!(f.normalized, "ehm");
        assert!(f.confidence < HESITATION_BASE * COLLAPSED_STRENGTH);
    }

    #[test]
    fn ordinary_words_are_not_fillers() {
        let r = analyze(&fluent(
            "en",
            &["the", "term", "here", "means", "more", "than", "one", "area"],
        ))
        .report;
        assert_eq!(r.total_count, 0, "{:?}", r.detected_fillers);
        assert_eq!(r.quality, FillerQuality::Excellent);
        assert_eq!(r.most_common, None);
    }

    #[test]
    fn discourse_marker_needs_surrounding_silence() {
        // "like" as a verb in fluent speech.
        let r = analyze(&fluent("en", &["i", "like", "pizza"])).report;
        assert_eq!(r.total_count, 0);

        // "like" set off by pauses.
        let t = Transcript::new(
            "en",
            vec![
                TranscriptWord::new("it", 0.0, 0.2),
                TranscriptWord::new("was", 0.3, 0.5),
                TranscriptWord::new("like", 1.0, 1.2),
                TranscriptWord::new("huge", 1.8, 2.1),
            ],
        );
        let r = analyze(&t).report;
        assert_eq!(r.total_count, 1);
        assert_eq!(r.detected_fillers[0].kind, FillerKind::DiscourseMarker);
        assert!((r.detected_fillers[0].confidence - (DISCOURSE_BASE + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn silence_raises_hesitation_confidence() {
        let t = Transcript::new(
            "en",
            vec![
                TranscriptWord::new("so", 0.0, 0.2),
                TranscriptWord::new("um", 0.8, 1.0),
                TranscriptWord::new("yes", 1.6, 1.9),
            ],
        );
        let f = &analyze(&t).report.detected_fillers[0];
        assert!((f.confidence - (HESITATION_BASE + 2.0 * HESITATION_GAP_BONUS)).abs() < 1e-9);
    }

    #[test]
    fn phrases_match_across_words() {
        let t = Transcript::new(
            "it",
            vec![
                TranscriptWord::new("è", 0.0, 0.1),
                TranscriptWord::new("come", 0.5, 0.7),
                TranscriptWord::new("dire,", 0.7, 0.9),
                TranscriptWord::new("complicato", 1.4, 2.0),
            ],
        );
        let r = analyze(&t).report;
        assert_eq!(r.total_count, 1);
        assert_eq!(r.detected_fillers[0].word, "come dire,");
        assert_eq!(r.detected_fillers[0].normalized, "come dire");
        assert_eq!(r.by_type.get("come dire"), Some(&1));
    }

    #[test]
    fn counts_partition_by_type() {
        let r = analyze(&fluent(
            "en",
            &["um", "so", "uh", "we", "um", "go", "ummm", "now", "erm"],
        ))
        .report;
        assert_eq!(r.total_count, r.detected_fillers.len());
        assert_eq!(r.by_type.values().sum::<usize>(), r.total_count);
        assert_eq!(r.by_type.get("um"), Some(&3));
        assert_eq!(r.most_common.as_deref(), Some("um"));
        assert!((r.filler_rate - 5.0 / 9.0 * 100.0).abs() < 1e-9);
        assert_eq!(r.quality, FillerQuality::Poor);
    }

    #[test]
    fn most_common_ties_break_alphabetically() {
        let r = analyze(&fluent("en", &["uh", "a", "um", "b"])).report;
        assert_eq!(r.most_common.as_deref(), Some("uh"));
    }

    #[test]
    fn unknown_language_falls_back_with_penalty_and_warning() {
        let out = analyze(&fluent("sv", &["vi", "ehm", "börjar"]));
        assert_eq!(
            out.warnings,
            vec![AnalysisWarning::UnknownLanguage {
                requested: "sv".into(),
                fallback: "en".into(),
            }]
        );
        let r = out.report;
        assert_eq!(r.lexicon_language, "en");
        assert_eq!(r.total_count, 1);
        let expected = HESITATION_BASE - FillerConfig::default().unknown_language_penalty;
        assert!((r.detected_fillers[0].confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn penalty_is_applied_after_the_gate() {
        // 0.85 clears the 0.8 gate; the 0.5 penalty only applies afterwards.
        let config = FillerConfig {
            min_confidence: 0.8,
            unknown_language_penalty: 0.5,
            ..FillerConfig::default()
        };
        let d = FillerDetector::new(config, Arc::new(LexiconSet::builtin("en").unwrap()));
        let t = fluent("sv", &["vi", "ehm", "börjar"]);
        let r = d.analyze(&t, t.last_end_time()).report;
        assert_eq!(r.total_count, 1);
        assert!(r.detected_fillers[0].confidence < 0.8);
    }

    #[test]
    fn empty_transcript_has_zero_rate() {
        let r = analyze(&Transcript::new("en", Vec::new())).report;
        assert_eq!(r.total_count, 0);
        assert_eq!(r.filler_rate, 0.0);
        assert_eq!(r.fillers_per_minute, 0.0);
    }

    #[test]
    fn rate_bands() {
        assert_eq!(FillerQuality::from_rate(1.9), FillerQuality::Excellent);
        assert_eq!(FillerQuality::from_rate(2.0), FillerQuality::Good);
        assert_eq!(FillerQuality::from_rate(5.0), FillerQuality::Good);
        assert_eq!(FillerQuality::from_rate(7.0), FillerQuality::Fair);
        assert_eq!(FillerQuality::from_rate(10.5), FillerQuality::Poor);
    }

    #[test]
    fn by_type_serializes_in_key_order() {
        let r = analyze(&fluent("en", &["um", "x", "ah", "y", "er"])).report;
        let json = serde_json::to_string(&r.by_type).unwrap();
        assert_eq!(json, r#"{"ah":1,"er":1,"um":1}"#);
    }
}
