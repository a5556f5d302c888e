//! Pause detection and classification.
//!
//! Unvoiced stretches of the [`VoiceActivityTimeline`] longer than
//! `min_pause_secs` become [`Pause`]s.  Silence before the first and after the
//! last voiced segment is ignored unless `include_edge_silence` is set; it is
//! lead-in/lead-out, not a pause the speaker chose.
//!
//! | Duration | Category |
//! |----------|----------|
//! | `< short_pause_max_secs` (0.5 s) | short |
//! | up to `long_pause_min_secs` (2 s) | medium |
//! | longer | long |

use serde::{Deserialize, Serialize};

use crate::audio::VoiceActivityTimeline;
use crate::config::PauseConfig;
use crate::transcript::Transcript;

use super::StageOutput;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseCategory {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseQuality {
    TooRare,
    Optimal,
    TooFrequent,
    /// No voiced audio, so the pause rate is meaningless.
    Indeterminate,
}

/// One silent interval between stretches of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub category: PauseCategory,
    pub context_before: Option<String>,
    pub context_after: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseDistribution {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseAnalysis {
    pub total_pauses: usize,
    pub total_pause_duration: f64,
    pub average_pause_duration: f64,
    pub min_pause_duration: f64,
    pub max_pause_duration: f64,
    /// Pauses per minute of speaking time.
    pub pauses_per_minute: f64,
    /// Percentage of the recording spent in pauses.
    pub pause_ratio: f64,
    pub distribution: PauseDistribution,
    pub quality: PauseQuality,
    /// `true` when the recording had no voiced audio, or too little for the
    /// pause rate to say anything about pacing.
    pub degraded: bool,
    pub pauses: Vec<Pause>,
}

// ---------------------------------------------------------------------------
// PauseAnalyzer
// ---------------------------------------------------------------------------

pub struct PauseAnalyzer {
    config: PauseConfig,
}

impl PauseAnalyzer {
    pub fn new(config: PauseConfig) -> Self {
        Self { config }
    }

    /// Sorted, non-overlapping `(start, end)` pause intervals.
    pub fn pause_intervals(&self, timeline: &VoiceActivityTimeline) -> Vec<(f64, f64)> {
        let min = self.config.min_pause_secs;

        if timeline.is_silent() {
            let duration = timeline.duration();
            return if duration > min {
                vec![(0.0, duration)]
            } else {
                Vec::new()
            };
        }

        let segments = timeline.segments();
        let last = segments.len() - 1;
        segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_voiced && s.duration() > min)
            .filter(|(i, _)| self.config.include_edge_silence || (*i != 0 && *i != last))
            .map(|(_, s)| (s.start, s.end))
            .collect()
    }

    /// Sum of all pause durations; the speech-rate analyser needs it before
    /// the full pause report exists.
    pub fn total_pause_secs(&self, timeline: &VoiceActivityTimeline) -> f64 {
        self.pause_intervals(timeline)
            .iter()
            .map(|(start, end)| end - start)
            .sum()
    }

    pub fn categorize(&self, duration: f64) -> PauseCategory {
        if duration < self.config.short_pause_max_secs {
            PauseCategory::Short
        } else if duration > self.config.long_pause_min_secs {
            PauseCategory::Long
        } else {
            PauseCategory::Medium
        }
    }

    pub fn analyze(
        &self,
        timeline: &VoiceActivityTimeline,
        transcript: &Transcript,
    ) -> StageOutput<PauseAnalysis> {
        let degraded = timeline.is_silent();
        let n = self.config.context_words;

        let pauses: Vec<Pause> = self
            .pause_intervals(timeline)
            .into_iter()
            .map(|(start, end)| {
                let duration = end - start;
                Pause {
                    start_time: start,
                    end_time: end,
                    duration,
                    category: if degraded {
                        PauseCategory::Long
                    } else {
                        self.categorize(duration)
                    },
                    context_before: transcript.words_before(start, n),
                    context_after: transcript.words_after(end, n),
                }
            })
            .collect();

        let total: f64 = pauses.iter().map(|p| p.duration).sum();
        let count = pauses.len();
        let (min, max) = pauses.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| {
            (lo.min(p.duration), hi.max(p.duration))
        });

        let mut distribution = PauseDistribution::default();
        for p in &pauses {
            match p.category {
                PauseCategory::Short => distribution.short += 1,
                PauseCategory::Medium => distribution.medium += 1,
                PauseCategory::Long => distribution.long += 1,
            }
        }

        let pauses_per_minute = if degraded {
            0.0
        } else {
            let span = if self.config.include_edge_silence {
                timeline.duration()
            } else {
                match (timeline.first_voiced_start(), timeline.last_voiced_end()) {
                    (Some(first), Some(last)) => last - first,
                    _ => 0.0,
                }
            };
            let speaking_secs = span - total;
            if speaking_secs > 0.0 {
                count as f64 / (speaking_secs / 60.0)
            } else {
                0.0
            }
        };

        let quality = if degraded {
            PauseQuality::Indeterminate
        } else if pauses_per_minute < self.config.min_pauses_per_minute {
            PauseQuality::TooRare
        } else if pauses_per_minute > self.config.max_pauses_per_minute {
            PauseQuality::TooFrequent
        } else {
            PauseQuality::Optimal
        };

        if degraded {
            log::warn!(
                "pause: {:.0}% of the recording is unvoiced, reporting one degraded pause",
                timeline.unvoiced_ratio() * 100.0
            );
        }
        log::debug!(
            "pause: {count} pauses, {total:.2}s total, {pauses_per_minute:.1}/min → {quality:?}"
        );

        let duration = timeline.duration();
        StageOutput::clean(PauseAnalysis {
            total_pauses: count,
            total_pause_duration: total,
            average_pause_duration: if count == 0 { 0.0 } else { total / count as f64 },
            min_pause_duration: if count == 0 { 0.0 } else { min },
            max_pause_duration: max,
            pauses_per_minute,
            pause_ratio: if duration > 0.0 { total / duration * 100.0 } else { 0.0 },
            distribution,
            quality,
            degraded,
            pauses,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
