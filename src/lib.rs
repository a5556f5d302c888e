//! Speech performance analytics.
//!
//! Turns a recorded speech signal plus its time-aligned transcript into an
//! [`AudioMetrics`](report::AudioMetrics) report covering pacing, pauses,
//! filler words, audio quality and a composite performance score.
//!
//! * [`audio`]     : recording type, validation, resampling, framing, VAD
//! * [`transcript`]: transcript types and the transcription collaborator
//! * [`analysis`]  : the four analysers and the scorer
//! * [`pipeline`]  : [`AnalyticsEngine`](pipeline::AnalyticsEngine), the async entry point
//! * [`config`]    : settings, validation and TOML persistence
//! * [`report`]    : the final report and its cache key

pub mod analysis;
pub mod audio;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod transcript;
