//! Voiced/unvoiced segmentation of a recording.
//!
//! [`VoiceActivityTimeline`] turns per-frame voicing flags into alternating
//! [`VoiceSegment`]s that tile `[0, duration]` with no gaps or overlaps.
//!
//! Each frame owns the hop-length slice of time centred on its window, so the
//! boundary between frames `i - 1` and `i` sits at
//! `i·hop + (frame − hop) / 2`.  The first segment starts at `0` and the last
//! one is stretched to the recording's end.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VoiceSegment
// ---------------------------------------------------------------------------

/// A maximal run of frames sharing one voicing decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSegment {
    pub start: f64,
    pub end: f64,
    pub is_voiced: bool,
}

impl VoiceSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ---------------------------------------------------------------------------
// VoiceActivityTimeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceActivityTimeline {
    segments: Vec<VoiceSegment>,
    frame_voicing: Vec<bool>,
    duration: f64,
    silent_unvoiced_ratio: f64,
}

impl VoiceActivityTimeline {
    /// Build the timeline from one voicing flag per frame.
    ///
    /// An empty `flags` slice yields a single unvoiced segment.
    pub fn from_frame_flags(flags: &[bool], frame_secs: f64, hop_secs: f64, duration: f64) -> Self {
        let duration = duration.max(0.0);
        let mut segments: Vec<VoiceSegment> = Vec::new();

        if flags.is_empty() {
            if duration > 0.0 {
                segments.push(VoiceSegment {
                    start: 0.0,
                    end: duration,
                    is_voiced: false,
                });
            }
            return Self {
                segments,
                frame_voicing: Vec::new(),
                duration,
                silent_unvoiced_ratio: 1.0,
            };
        }

        let centre_offset = ((frame_secs - hop_secs) / 2.0).max(0.0);
        let boundary = |i: usize| -> f64 {
            if i == 0 {
                0.0
            } else {
                (i as f64 * hop_secs + centre_offset).min(duration)
            }
        };

        let mut run_start = 0;
        for i in 1..=flags.len() {
            if i < flags.len() && flags[i] == flags[run_start] {
                continue;
            }
            let start = boundary(run_start);
            let end = if i == flags.len() { duration } else { boundary(i) };
            push_segment(&mut segments, start, end, flags[run_start]);
            run_start = i;
        }

        Self {
            segments,
            frame_voicing: flags.to_vec(),
            duration,
            silent_unvoiced_ratio: 1.0,
        }
    }

    /// Treat the recording as silent once its unvoiced share reaches `ratio`.
    ///
    /// The default of `1.0` only counts a recording with no voiced frame.
    pub fn with_silent_unvoiced_ratio(mut self, ratio: f64) -> Self {
        self.silent_unvoiced_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn segments(&self) -> &[VoiceSegment] {
        &self.segments
    }

    /// Voicing decision per analysis frame.
    pub fn frame_voicing(&self) -> &[bool] {
        &self.frame_voicing
    }

    pub fn is_frame_voiced(&self, index: usize) -> bool {
        self.frame_voicing.get(index).copied().unwrap_or(false)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn has_voice(&self) -> bool {
        self.segments.iter().any(|s| s.is_voiced)
    }

    /// Fraction (0–1) of the recording that is unvoiced.
    pub fn unvoiced_ratio(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.voiced_secs() / self.duration).clamp(0.0, 1.0)
    }

    /// `true` when there is no voiced frame, or when a stray blip of voicing
    /// leaves the unvoiced share at or above the configured ratio.
    pub fn is_silent(&self) -> bool {
        !self.has_voice() || self.unvoiced_ratio() >= self.silent_unvoiced_ratio
    }

    /// Total voiced time in seconds.
    pub fn voiced_secs(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.is_voiced)
            .map(VoiceSegment::duration)
            .sum()
    }

    pub fn unvoiced_segments(&self) -> impl Iterator<Item = &VoiceSegment> {
        self.segments.iter().filter(|s| !s.is_voiced)
    }

    /// Start of the first voiced segment.
    pub fn first_voiced_start(&self) -> Option<f64> {
        self.segments.iter().find(|s| s.is_voiced).map(|s| s.start)
    }

    /// End of the last voiced segment.
    pub fn last_voiced_end(&self) -> Option<f64> {
        self.segments.iter().rev().find(|s| s.is_voiced).map(|s| s.end)
    }
}

/// Append a segment, dropping empty ones and merging same-voicing neighbours
/// that an empty segment would otherwise have separated.
fn push_segment(segments: &mut Vec<VoiceSegment>, start: f64, end: f64, is_voiced: bool) {
    if end <= start {
        return;
    }
    match segments.last_mut() {
        Some(last) if last.is_voiced == is_voiced => last.end = end,
        _ => segments.push(VoiceSegment {
            start,
            end,
            is_voiced,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
