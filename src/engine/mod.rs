//! Inference engines and the registry that owns them.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       EngineRegistry                          │
//! │                                                               │
//! │   EngineLoader ──(first use, once)──▶ EngineHandle<dyn …>     │
//! │        │                                   │                  │
//! │        ├─ load_transcription  ─▶ TranscriptionEngine (Whisper)│
//! │        ├─ load_translation    ─▶ TranslationEngine   (HTTP)   │
//! │        └─ load_synthesis      ─▶ SynthesisEngine     (HTTP)   │
//! │                                                               │
//! │   failed loads are remembered as Unavailable until reload()   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transcription is CPU-bound and synchronous; the pipeline runs it on
//! `tokio::task::spawn_blocking`.  Translation and synthesis talk to model
//! servers and are `async`.

pub mod loader;
pub mod registry;
pub mod remote;
pub mod whisper;

#[cfg(test)]
pub(crate) mod mock;

pub use loader::{ConfiguredLoader, EngineLoader, WHISPER_DISABLED_HINT};
pub use registry::{EngineHandle, EngineRegistry, EngineStatus, EngineUnavailable, InferencePermit};
pub use remote::{RemoteSynthesizer, RemoteTranslator};
pub use whisper::{SamplingStrategy, WhisperParams};
#[cfg(feature = "whisper")]
pub use whisper::WhisperTranscriber;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::DecodedAudio;

// ---------------------------------------------------------------------------
// EngineKind
// ---------------------------------------------------------------------------

/// The three capabilities the pipeline chains together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Transcription,
    Translation,
    Synthesis,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [
        EngineKind::Transcription,
        EngineKind::Translation,
        EngineKind::Synthesis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EngineKind::Transcription => "transcription",
            EngineKind::Translation => "translation",
            EngineKind::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Errors from constructing or running an engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The engine could not be initialised (bad model file, client setup…).
    #[error("engine initialisation failed: {0}")]
    Init(String),

    /// The backend was compiled out or switched off.
    #[error("engine disabled: {0}")]
    Disabled(String),

    /// The inference pass itself failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The model server did not answer within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The model server answered with something we could not parse.
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// DecodingParams
// ---------------------------------------------------------------------------

/// Decoding policy for the translation model.
///
/// Beam search with early stopping is deterministic for identical input and
/// model state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingParams {
    /// Beam width.
    pub num_beams: u32,
    /// Stop as soon as every beam has produced an end-of-sequence token.
    pub early_stopping: bool,
    /// Maximum length of the generated sequence, in tokens.
    pub max_length: u32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            num_beams: 5,
            early_stopping: true,
            max_length: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Behaviour shared by every engine.
pub trait Engine: Send + Sync {
    /// Short name for log lines (e.g. `"whisper:small"`).
    fn name(&self) -> &str;

    /// Whether inference calls may overlap.
    ///
    /// When `false` the registry hands out handles that serialise inference
    /// behind a per-engine mutex.
    fn supports_concurrent_inference(&self) -> bool {
        false
    }
}

/// Speech → text.  Blocking; called from the blocking thread pool.
///
/// `audio` is mono `f32` at `audio.sample_rate`; `language` is an engine tag
/// from [`crate::language::resolver::engine_language_tag`] (`"auto"` asks the
/// engine to detect the language).
pub trait TranscriptionEngine: Engine {
    fn transcribe(&self, audio: &DecodedAudio, language: &str) -> Result<String, EngineError>;
}

/// Text → text in another language.
#[async_trait]
pub trait TranslationEngine: Engine {
    async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
        decoding: &DecodingParams,
    ) -> Result<String, EngineError>;
}

/// Text → encoded audio bytes (WAV) spoken with `voice_tag`.
#[async_trait]
pub trait SynthesisEngine: Engine {
    async fn synthesize(&self, text: &str, voice_tag: &str) -> Result<Vec<u8>, EngineError>;
}

// Compile-time assertion: all three capability traits are object-safe.
const _: fn() = || {
    fn _assert_object_safe(
        _: Box<dyn TranscriptionEngine>,
        _: Box<dyn TranslationEngine>,
        _: Box<dyn SynthesisEngine>,
    ) {
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_decoding_is_beam_five_with_early_stopping() {
        let d = DecodingParams::default();
        assert_eq!(d.num_beams, 5);
        assert!(d.early_stopping);
        assert_eq!(d.max_length, 512);
    }

    #[test]
    fn engine_kind_labels() {
        let labels: Vec<_> = EngineKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, ["transcription", "translation", "synthesis"]);
    }

    #[test]
    fn engine_error_display_carries_detail() {
        let e = EngineError::ModelNotFound("/models/ggml-small.bin".into());
        assert!(e.to_string().contains("/models/ggml-small.bin"));
        assert_eq!(EngineError::Timeout.to_string(), "request timed out");
    }
}
