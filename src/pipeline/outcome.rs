//! Typed stage outcomes and the per-request result.
//!
//! A failing stage never produces a string that merely *contains* an error
//! word: it produces [`StageOutcome::Failure`] carrying an [`ErrorKind`].

use std::time::Duration;

use thiserror::Error;

use crate::language::{Direction, DirectionError, LanguageCode, ResolveError};

use super::request::Mode;

// ---------------------------------------------------------------------------
// ErrorKind / StageError
// ---------------------------------------------------------------------------

/// Why a stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Voice request without any audio samples.
    EmptyAudio,
    /// Text to translate or speak is blank after trimming.
    EmptyInput,
    /// The direction label or language pair is not in the direction table.
    UnsupportedDirection,
    /// The target language has no voice and substitution is not allowed.
    UnsupportedVoice,
    /// The engine for the stage failed to load.
    EngineUnavailable,
    TranscriptionFailure,
    TranslationFailure,
    SynthesisFailure,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::EmptyAudio => "empty audio",
            ErrorKind::EmptyInput => "empty input",
            ErrorKind::UnsupportedDirection => "unsupported direction",
            ErrorKind::UnsupportedVoice => "unsupported voice",
            ErrorKind::EngineUnavailable => "engine unavailable",
            ErrorKind::TranscriptionFailure => "transcription failure",
            ErrorKind::TranslationFailure => "translation failure",
            ErrorKind::SynthesisFailure => "synthesis failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A stage failure: the kind plus a detail string for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl StageError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<ResolveError> for StageError {
    fn from(e: ResolveError) -> Self {
        StageError::new(ErrorKind::UnsupportedDirection, e.to_string())
    }
}

impl From<DirectionError> for StageError {
    fn from(e: DirectionError) -> Self {
        StageError::new(ErrorKind::UnsupportedDirection, e.to_string())
    }
}

// ---------------------------------------------------------------------------
// StageOutcome
// ---------------------------------------------------------------------------

/// Result of one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Success(T),
    Failure(StageError),
    /// An earlier stage failed, so this one never ran.
    NotAttempted,
}

impl<T> StageOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failure(_))
    }

    pub fn is_not_attempted(&self) -> bool {
        matches!(self, StageOutcome::NotAttempted)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            StageOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StageError> {
        match self {
            StageOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }

    /// Kind of the failure, if the stage failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }
}

impl<T> From<Result<T, StageError>> for StageOutcome<T> {
    fn from(result: Result<T, StageError>) -> Self {
        match result {
            Ok(v) => StageOutcome::Success(v),
            Err(e) => StageOutcome::Failure(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage / PipelineStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Transcription,
    Translation,
    Synthesis,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Transcription => "transcription",
            Stage::Translation => "translation",
            Stage::Synthesis => "synthesis",
        })
    }
}

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every stage succeeded.
    Done,
    /// The named stage failed; later stages were not attempted.
    Aborted(Stage),
}

// ---------------------------------------------------------------------------
// SynthesizedSpeech
// ---------------------------------------------------------------------------

/// Output of the synthesis stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    /// Encoded audio (WAV) as returned by the engine.
    pub audio: Vec<u8>,
    /// Voice tag the engine spoke with.
    pub voice_tag: String,
    /// Set when the target language had no voice of its own and
    /// `voice_tag` is a stand-in for it.
    pub substituted_for: Option<LanguageCode>,
}

impl SynthesizedSpeech {
    pub fn is_substituted(&self) -> bool {
        self.substituted_for.is_some()
    }
}

// ---------------------------------------------------------------------------
// PipelineResult
// ---------------------------------------------------------------------------

/// Everything one request produced.  Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub mode: Mode,
    pub direction: Direction,
    /// `None` for text requests, which have no transcription stage.
    pub transcription: Option<StageOutcome<String>>,
    pub translation: StageOutcome<String>,
    pub synthesis: StageOutcome<SynthesizedSpeech>,
    pub elapsed: Duration,
}

impl PipelineResult {
    /// The failed stage and its error, if any.
    pub fn failure(&self) -> Option<(Stage, &StageError)> {
        if let Some(e) = self.transcription.as_ref().and_then(StageOutcome::error) {
            return Some((Stage::Transcription, e));
        }
        if let Some(e) = self.translation.error() {
            return Some((Stage::Translation, e));
        }
        self.synthesis.error().map(|e| (Stage::Synthesis, e))
    }

    pub fn status(&self) -> PipelineStatus {
        match self.failure() {
            Some((stage, _)) => PipelineStatus::Aborted(stage),
            None => PipelineStatus::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status() == PipelineStatus::Done
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcription
            .as_ref()
            .and_then(StageOutcome::value)
            .map(String::as_str)
    }

    pub fn translated_text(&self) -> Option<&str> {
        self.translation.value().map(String::as_str)
    }

    pub fn speech(&self) -> Option<&SynthesizedSpeech> {
        self.synthesis.value()
    }
}
