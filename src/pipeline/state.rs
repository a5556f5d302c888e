//! Stage labels and the result type of one analysis call.
//!
//! ```text
//! Preprocessing ──▶ Analyzing (4 tasks) ──▶ Scoring ──▶ Completed
//! any stage ──cancel──▶ Cancelled
//! any stage ──error───▶ Err(AnalysisError)
//! ```

use std::fmt;

use crate::report::AudioMetrics;

// ---------------------------------------------------------------------------
// AnalysisStage
// ---------------------------------------------------------------------------

/// Phases of [`AnalyticsEngine::analyze`](super::AnalyticsEngine::analyze),
/// used to label timing and cancellation logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    /// Validation, resampling, framing and VAD on the blocking pool.
    Preprocessing,
    /// The four analysers running concurrently.
    Analyzing,
    /// Scoring and assembly of the final report.
    Scoring,
}

impl AnalysisStage {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStage::Preprocessing => "preprocessing",
            AnalysisStage::Analyzing => "analyzing",
            AnalysisStage::Scoring => "scoring",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AnalysisOutcome
// ---------------------------------------------------------------------------

/// How an analysis call ended when it did not fail.
///
/// Cancellation is not an error: the caller asked for it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(Box<AudioMetrics>),
    Cancelled,
}

impl AnalysisOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisOutcome::Cancelled)
    }

    /// The report, or `None` if the call was cancelled.
    pub fn into_metrics(self) -> Option<AudioMetrics> {
        match self {
            AnalysisOutcome::Completed(metrics) => Some(*metrics),
            AnalysisOutcome::Cancelled => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
