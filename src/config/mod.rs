//! Configuration module for the speech analytics engine.
//!
//! Provides `AnalyticsConfig` (top-level settings), sub-configs for each
//! pipeline stage, `AppPaths` for cross-platform config directories, and TOML
//! persistence via `AnalyticsConfig::load` / `AnalyticsConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AnalyticsConfig, AudioConfig, AudioQualityConfig, ClarityBands, ConfigError, FillerConfig,
    PauseConfig, PitchBands, ScorerConfig, ScorerWeights, SpeechRateConfig, VadConfig,
    VolumeBands, WpmBands,
};
