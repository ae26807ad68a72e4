//! The surface a presentation layer talks to.
//!
//! [`Translator`] bundles the engine registry, the orchestrator and the
//! result cache.  It is cheap to clone; every clone shares the same engines
//! and the same cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::audio::{AudioDecoder, WavDecoder};
use crate::config::AppConfig;
use crate::engine::{ConfiguredLoader, EngineKind, EngineLoader, EngineRegistry, EngineStatus};
use crate::pipeline::{Mode, PipelineOrchestrator, PipelineRequest, PipelineResult, ResultCache, StageSettings};

/// Submit requests, read back the last result per mode, inspect engines.
///
/// ```rust,no_run
/// use voice_translator::config::AppConfig;
/// use voice_translator::language::DirectionResolver;
/// use voice_translator::pipeline::{Mode, PipelineRequest};
/// use voice_translator::Translator;
///
/// # async fn example() {
/// let translator = Translator::from_config(AppConfig::default());
/// let direction = DirectionResolver::resolve("French → Mooré").unwrap();
///
/// let result = translator.submit(PipelineRequest::text(direction, "Bonjour")).await;
/// assert!(translator.last_result(Mode::Text).is_some());
/// println!("{:?}", result.translated_text());
/// # }
/// ```
#[derive(Clone)]
pub struct Translator {
    orchestrator: Arc<PipelineOrchestrator>,
    cache: Arc<ResultCache>,
}

impl Translator {
    pub fn new(
        loader: Arc<dyn EngineLoader>,
        decoder: Arc<dyn AudioDecoder>,
        settings: StageSettings,
    ) -> Self {
        let registry = Arc::new(EngineRegistry::new(loader));
        Self {
            orchestrator: Arc::new(PipelineOrchestrator::new(registry, decoder, settings)),
            cache: Arc::new(ResultCache::new()),
        }
    }

    /// Whisper + HTTP engines, WAV input, all settings from `config`.
    pub fn from_config(config: AppConfig) -> Self {
        let settings = StageSettings::from_config(&config);
        Self::new(
            Arc::new(ConfiguredLoader::new(config)),
            Arc::new(WavDecoder::default()),
            settings,
        )
    }

    /// Run `request` to completion and remember the result for its mode.
    pub async fn submit(&self, request: PipelineRequest) -> Arc<PipelineResult> {
        let result = Arc::new(self.orchestrator.run(&request).await);
        self.cache.put(result.mode, Arc::clone(&result));
        result
    }

    /// Most recent result for `mode`, if any request of that mode has run.
    pub fn last_result(&self, mode: Mode) -> Option<Arc<PipelineResult>> {
        self.cache.get(mode)
    }

    /// Load state of every engine kind.  Does not load anything.
    pub fn engine_status(&self) -> BTreeMap<EngineKind, EngineStatus> {
        self.orchestrator.registry().status()
    }

    /// Engine kinds whose load failed.
    pub fn unavailable_engines(&self) -> Vec<EngineKind> {
        self.orchestrator.registry().unavailable()
    }

    /// Load every engine now instead of on the first request.
    pub async fn warm_up(&self) -> BTreeMap<EngineKind, EngineStatus> {
        let report = self.orchestrator.registry().preload().await;
        for (kind, status) in &report {
            if let EngineStatus::Unavailable(reason) = status {
                log::warn!("translator: {kind} engine unavailable after warm-up: {reason}");
            }
        }
        report
    }

    /// Drop the cached `kind` engine (or its load failure); the next request
    /// that needs it loads it again.
    pub fn reload_engine(&self, kind: EngineKind) {
        self.orchestrator.registry().reload(kind);
    }
}
