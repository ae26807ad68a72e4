//! Engine construction.
//!
//! The registry decides *when* an engine is built; an [`EngineLoader`]
//! decides *how*.  Loader methods are blocking (model files are read from
//! disk) and are always called on the blocking pool.

use std::sync::Arc;

use crate::config::AppConfig;

use super::{EngineError, RemoteSynthesizer, RemoteTranslator, SynthesisEngine, TranscriptionEngine, TranslationEngine};

/// Builds one engine instance per call.
pub trait EngineLoader: Send + Sync {
    fn load_transcription(&self) -> Result<Arc<dyn TranscriptionEngine>, EngineError>;
    fn load_translation(&self) -> Result<Arc<dyn TranslationEngine>, EngineError>;
    fn load_synthesis(&self) -> Result<Arc<dyn SynthesisEngine>, EngineError>;
}

/// Loader driven by [`AppConfig`]: Whisper for transcription, HTTP model
/// servers for translation and synthesis.
#[derive(Debug, Clone)]
pub struct ConfiguredLoader {
    config: AppConfig,
}

impl ConfiguredLoader {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `true` when this build can load a local transcription engine.
    pub const fn transcription_enabled() -> bool {
        cfg!(feature = "whisper")
    }
}

/// Reported when voice input reaches a build without Whisper support.
pub const WHISPER_DISABLED_HINT: &str =
    "built without the `whisper` feature; rebuild with `--features whisper` to transcribe voice input";

impl EngineLoader for ConfiguredLoader {
    #[cfg(feature = "whisper")]
    fn load_transcription(&self) -> Result<Arc<dyn TranscriptionEngine>, EngineError> {
        let path = self.config.transcription.model_path();
        log::info!("loader: loading Whisper model {}", path.display());
        let engine = super::WhisperTranscriber::load(&path, self.config.transcription.whisper.clone())?;
        Ok(Arc::new(engine))
    }

    #[cfg(not(feature = "whisper"))]
    fn load_transcription(&self) -> Result<Arc<dyn TranscriptionEngine>, EngineError> {
        Err(EngineError::Disabled(WHISPER_DISABLED_HINT.into()))
    }

    fn load_translation(&self) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        log::info!(
            "loader: translation via {} ({})",
            self.config.translation.base_url,
            self.config.translation.model
        );
        Ok(Arc::new(RemoteTranslator::from_config(&self.config.translation)?))
    }

    fn load_synthesis(&self) -> Result<Arc<dyn SynthesisEngine>, EngineError> {
        log::info!(
            "loader: synthesis via {} ({})",
            self.config.synthesis.base_url,
            self.config.synthesis.model
        );
        Ok(Arc::new(RemoteSynthesizer::from_config(&self.config.synthesis)?))
    }
}
