//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`: a settings file only needs the keys
//! it changes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::engine::{DecodingParams, WhisperParams};

// ---------------------------------------------------------------------------
// VoicePolicy
// ---------------------------------------------------------------------------

/// What synthesis does when the target language has no native voice.
///
/// | Variant    | Behaviour                                                   |
/// |------------|-------------------------------------------------------------|
/// | Substitute | Speak with the substitute voice and record the substitution |
/// | Reject     | Fail the synthesis stage with `UnsupportedVoice`            |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePolicy {
    Substitute,
    Reject,
}

impl Default for VoicePolicy {
    fn default() -> Self {
        Self::Substitute
    }
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper transcription engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// GGML model name; the file is `ggml-<model>.bin`.
    pub model: String,
    /// Directory holding the model file.  `None` uses [`AppPaths::models_dir`].
    pub models_dir: Option<PathBuf>,
    pub whisper: WhisperParams,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "small".into(),
            models_dir: None,
            whisper: WhisperParams::default(),
        }
    }
}

impl TranscriptionConfig {
    /// Full path of the GGML model file.
    pub fn model_path(&self) -> PathBuf {
        let dir = self
            .models_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().models_dir);
        dir.join(format!("ggml-{}.bin", self.model))
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the translation model server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the inference endpoint.
    ///
    /// - Hugging Face: `https://api-inference.huggingface.co`
    /// - Self-hosted text-generation-inference / custom server: its root URL
    pub base_url: String,
    /// Bearer token.  `None` or empty sends no `Authorization` header.
    pub api_key: Option<String>,
    /// Model identifier appended to `{base_url}/models/`.
    pub model: String,
    /// Input longer than this many tokens is truncated before translation.
    /// No tokenizer is available here, so tokens are estimated per word as
    /// one subword piece per started four characters.
    pub max_input_tokens: usize,
    /// Maximum seconds to wait for one translation.
    pub timeout_secs: u64,
    pub decoding: DecodingParams,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".into(),
            api_key: None,
            model: "mafromedia/yaaba-fr-mo-nllb600M".into(),
            max_input_tokens: 512,
            timeout_secs: 60,
            decoding: DecodingParams::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Settings for the speech synthesis server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of a Coqui TTS server (`/api/tts`).
    pub base_url: String,
    /// Model name, used for log lines and the engine name.
    pub model: String,
    /// Speaker id for multi-speaker models.  `None` lets the server choose.
    pub speaker: Option<String>,
    pub voice_policy: VoicePolicy,
    /// Maximum seconds to wait for one synthesis.
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5002".into(),
            model: "tts_models/multilingual/multi-dataset/xtts_v2".into(),
            speaker: None,
            voice_policy: VoicePolicy::default(),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Settings for the stage orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on each stage, in seconds.  `None` waits indefinitely.
    pub stage_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_translator::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transcription: TranscriptionConfig,
    pub translation: TranslationConfig,
    pub synthesis: SynthesisConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
