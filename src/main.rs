//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AnalyticsConfig`] from `--config` or the platform settings file
//!    (defaults when missing) and merge any lexicons found in the lexicon
//!    directory.
//! 3. Build the [`AnalyticsEngine`] (fails fast on invalid settings).
//! 4. Read the WAV recording and the transcript JSON.
//! 5. Run the analysis; Ctrl-C cancels it.
//! 6. Print or write the report JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use speech_analytics::{
    audio::{AudioCaptureProvider, WavFileCapture},
    config::{AnalyticsConfig, AppPaths},
    pipeline::{AnalysisOutcome, AnalyticsEngine},
    report::AnalysisKey,
    transcript::{JsonTranscriptFile, TranscriptionProvider},
};

/// Exit status used when the user interrupts an analysis.
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "speech-analytics")]
#[command(about = "Speech performance analytics for a recording and its transcript")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a WAV recording against its transcript
    Analyze {
        /// WAV file (any sample rate >= 8 kHz; stereo is downmixed)
        #[arg(long)]
        audio: PathBuf,

        /// Transcript JSON: {"language", "text"?, "words": [{"word", "startTime", "endTime"}]}
        #[arg(long)]
        transcript: PathBuf,

        /// Override the transcript language
        #[arg(long)]
        language: Option<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print (or write) the default settings as TOML
    DefaultConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = AppPaths::new();

    match cli.command {
        Command::DefaultConfig { output } => {
            let config = AnalyticsConfig::default();
            match output {
                Some(path) => {
                    config.save_to(&path)?;
                    log::info!("wrote default settings to {}", path.display());
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
        Command::Analyze {
            audio,
            transcript,
            language,
            output,
            pretty,
        } => {
            let config_path = cli.config.unwrap_or_else(|| paths.settings_file.clone());
            let config = load_config(&config_path, &paths)?;
            let outcome = analyze(config, audio, transcript, language).await?;

            let Some(metrics) = outcome.into_metrics() else {
                log::warn!("analysis cancelled");
                std::process::exit(EXIT_CANCELLED);
            };

            let json = if pretty {
                metrics.to_json_pretty()?
            } else {
                metrics.to_json()?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    log::info!("report written to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
    }
}

/// 2. Settings file plus lexicons discovered on disk; explicit
/// `filler.lexicon_paths` entries win over discovered ones.
fn load_config(path: &Path, paths: &AppPaths) -> Result<AnalyticsConfig> {
    let mut config = AnalyticsConfig::load_from(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    for (language, file) in paths.discover_lexicons() {
        config.filler.lexicon_paths.entry(language).or_insert(file);
    }
    Ok(config)
}

async fn analyze(
    config: AnalyticsConfig,
    audio_path: PathBuf,
    transcript_path: PathBuf,
    language: Option<String>,
) -> Result<AnalysisOutcome> {
    // 3. Engine
    let engine = AnalyticsEngine::new(config).context("invalid settings")?;

    // 4. Inputs (file I/O off the async workers)
    let capture = WavFileCapture::new(&audio_path);
    let recording = tokio::task::spawn_blocking(move || capture.capture()).await??;
    let transcript = JsonTranscriptFile::new(&transcript_path)
        .with_language(language)
        .transcribe(&recording)
        .await?;

    let key = AnalysisKey::new(&recording, &transcript)?;
    log::info!(
        "analysing {} ({:.1}s @ {} Hz, {} words) key {key}",
        audio_path.display(),
        recording.duration_secs,
        recording.sample_rate,
        transcript.word_count()
    );

    // 5. Ctrl-C cancels the running analysis
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    Ok(engine.analyze(&recording, &transcript, &cancel).await?)
}
