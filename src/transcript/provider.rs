//! The transcription collaborator.
//!
//! Speech recognition itself lives outside this crate.  Anything that can turn
//! a [`RecordedAudio`] into a time-aligned [`Transcript`] implements
//! [`TranscriptionProvider`]; [`JsonTranscriptFile`] reads a transcript that
//! an external recogniser already wrote to disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::RecordedAudio;

use super::Transcript;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

/// Errors raised by a [`TranscriptionProvider`].
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("failed to read transcript {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse transcript {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The recogniser itself failed.
    #[error("transcription failed: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// TranscriptionProvider trait
// ---------------------------------------------------------------------------

/// Async source of time-aligned transcripts.
///
/// Implementors must be `Send + Sync` so they can sit behind
/// `Arc<dyn TranscriptionProvider>`.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, audio: &RecordedAudio) -> Result<Transcript, TranscriptionError>;
}

// ---------------------------------------------------------------------------
// JsonTranscriptFile
// ---------------------------------------------------------------------------

/// Reads a transcript from a JSON file of the form
/// `{"language": "en", "words": [{"word": "hi", "startTime": 0.1, "endTime": 0.3}]}`.
///
/// The audio argument is ignored; the file is assumed to belong to it.
pub struct JsonTranscriptFile {
    path: PathBuf,
    language_override: Option<String>,
}

impl JsonTranscriptFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            language_override: None,
        }
    }

    /// Replace whatever language the file declares.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language_override = language;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TranscriptionProvider for JsonTranscriptFile {
    async fn transcribe(&self, _audio: &RecordedAudio) -> Result<Transcript, TranscriptionError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TranscriptionError::Io {
                path: self.path.clone(),
                source,
            })?;

        let mut transcript: Transcript =
            serde_json::from_str(&content).map_err(|e| TranscriptionError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        if let Some(language) = &self.language_override {
            transcript.language = language.clone();
        }

        log::debug!(
            "transcript: loaded {} words ({}) from {}",
            transcript.words.len(),
            transcript.language,
            self.path.display()
        );
        Ok(transcript)
    }
}

// ---------------------------------------------------------------------------
// FixedTranscript
// ---------------------------------------------------------------------------

/// Provider that always hands back the same transcript.
///
/// Handy in tests and when the transcript is already in memory.
pub struct FixedTranscript(pub Transcript);

#[async_trait]
impl TranscriptionProvider for FixedTranscript {
    async fn transcribe(&self, _audio: &RecordedAudio) -> Result<Transcript, TranscriptionError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
