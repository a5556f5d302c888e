//! Time-aligned transcript types and the transcription collaborator.
//!
//! [`Transcript`] is what the Transcription Provider hands over: the
//! recording's language code plus an ordered list of [`TranscriptWord`]s with
//! start/end timestamps in seconds.  The engine only borrows it.
//!
//! ```rust
//! use speech_analytics::transcript::{Transcript, TranscriptWord};
//!
//! let t = Transcript::new(
//!     "en",
//!     vec![
//!         TranscriptWord::new("hello", 0.0, 0.4),
//!         TranscriptWord::new("world", 0.5, 0.9),
//!     ],
//! );
//! assert_eq!(t.word_count(), 2);
//! assert_eq!(t.words_after(0.45, 3).as_deref(), Some("world"));
//! ```

pub mod provider;

pub use provider::{
    FixedTranscript, JsonTranscriptFile, TranscriptionError, TranscriptionProvider,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slack used when comparing word boundaries to pause boundaries.
const BOUNDARY_EPSILON_SECS: f64 = 0.05;

// ---------------------------------------------------------------------------
// TranscriptError
// ---------------------------------------------------------------------------

/// Reason a transcript was rejected before analysis.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscriptError {
    /// A word has non-finite, negative or inverted timestamps, or is out of
    /// order.
    #[error("invalid transcript word #{index}: {reason}")]
    InvalidWord { index: usize, reason: String },

    /// Word timestamps run past the end of the audio.
    #[error(
        "transcript ends at {transcript_end:.2}s but audio is only {audio_secs:.2}s long"
    )]
    Mismatch {
        transcript_end: f64,
        audio_secs: f64,
    },
}

// ---------------------------------------------------------------------------
// TranscriptWord
// ---------------------------------------------------------------------------

/// A single recognised word with its position in the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptWord {
    pub word: String,
    /// Seconds from the start of the recording.
    pub start_time: f64,
    /// Seconds from the start of the recording.
    pub end_time: f64,
}

impl TranscriptWord {
    pub fn new(word: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            word: word.into(),
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Ordered, time-aligned transcript of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Detected or declared language (ISO-639-1, optionally with a region
    /// suffix such as `it-IT`).
    pub language: String,
    /// Full text as returned by the provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Vec<TranscriptWord>,
}

impl Transcript {
    pub fn new(language: impl Into<String>, words: Vec<TranscriptWord>) -> Self {
        Self {
            language: language.into(),
            text: None,
            words,
        }
    }

    /// Number of non-blank words.
    pub fn word_count(&self) -> usize {
        self.words
            .iter()
            .filter(|w| !w.word.trim().is_empty())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// End time of the last word, or `0.0` for an empty transcript.
    pub fn last_end_time(&self) -> f64 {
        self.words
            .iter()
            .map(|w| w.end_time)
            .fold(0.0_f64, f64::max)
    }

    /// Primary language subtag, lowercased (`"it-IT"` → `"it"`).
    pub fn primary_language(&self) -> String {
        primary_subtag(&self.language)
    }

    /// Check timestamps for sanity and against the audio duration.
    ///
    /// Words must have finite, non-negative timestamps with
    /// `end_time >= start_time`, sorted by `start_time`.  The last word may end
    /// at most `tolerance_secs` after the audio does.
    pub fn validate(&self, audio_secs: f64, tolerance_secs: f64) -> Result<(), TranscriptError> {
        let mut previous_start = 0.0_f64;
        for (index, w) in self.words.iter().enumerate() {
            if !w.start_time.is_finite() || !w.end_time.is_finite() {
                return Err(TranscriptError::InvalidWord {
                    index,
                    reason: "non-finite timestamp".into(),
                });
            }
            if w.start_time < 0.0 {
                return Err(TranscriptError::InvalidWord {
                    index,
                    reason: format!("negative start time {:.3}", w.start_time),
                });
            }
            if w.end_time < w.start_time {
                return Err(TranscriptError::InvalidWord {
                    index,
                    reason: format!(
                        "ends ({:.3}) before it starts ({:.3})",
                        w.end_time, w.start_time
                    ),
                });
            }
            if w.start_time < previous_start {
                return Err(TranscriptError::InvalidWord {
                    index,
                    reason: "words are not sorted by start time".into(),
                });
            }
            previous_start = w.start_time;
        }

        let transcript_end = self.last_end_time();
        if transcript_end > audio_secs + tolerance_secs {
            return Err(TranscriptError::Mismatch {
                transcript_end,
                audio_secs,
            });
        }
        Ok(())
    }

    /// Up to `n` words that end at or before `time`, joined by spaces.
    ///
    /// Returns `None` when there are no such words.
    pub fn words_before(&self, time: f64, n: usize) -> Option<String> {
        if n == 0 {
            return None;
        }
        let preceding: Vec<&str> = self
            .words
            .iter()
            .filter(|w| w.end_time <= time + BOUNDARY_EPSILON_SECS)
            .map(|w| w.word.trim())
            .filter(|w| !w.is_empty())
            .collect();
        let start = preceding.len().saturating_sub(n);
        join_words(&preceding[start..])
    }

    /// Up to `n` words that start at or after `time`, joined by spaces.
    pub fn words_after(&self, time: f64, n: usize) -> Option<String> {
        let following: Vec<&str> = self
            .words
            .iter()
            .filter(|w| w.start_time >= time - BOUNDARY_EPSILON_SECS)
            .map(|w| w.word.trim())
            .filter(|w| !w.is_empty())
            .take(n)
            .collect();
        join_words(&following)
    }

    /// The words in `index - n ..= index + n`, joined by spaces.
    pub fn context_around(&self, index: usize, n: usize) -> String {
        if self.words.is_empty() {
            return String::new();
        }
        let index = index.min(self.words.len() - 1);
        let start = index.saturating_sub(n);
        let end = (index + n + 1).min(self.words.len());
        self.words[start..end]
            .iter()
            .map(|w| w.word.trim())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Primary language subtag, lowercased: `"it-IT"` → `"it"`.
pub fn primary_subtag(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

fn join_words(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
