//! Lazy, exactly-once engine construction.
//!
//! [`EngineRegistry`] keeps one slot per [`EngineKind`].  The first caller
//! that asks for an engine starts the matching [`EngineLoader`] method on the
//! blocking pool from a task of its own; every concurrent caller waits on the
//! same `OnceCell` and receives the same handle.  Cancelling a waiting caller
//! does not cancel the load.  A failed load is stored as well, so a missing
//! model file is reported once instead of being retried on every request.
//!
//! [`EngineRegistry::reload`] swaps in an empty slot; the next request loads
//! the engine again.  Requests already holding the old handle finish with it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OnceCell, OwnedMutexGuard};

use super::loader::EngineLoader;
use super::{Engine, EngineError, EngineKind, SynthesisEngine, TranscriptionEngine, TranslationEngine};

// ---------------------------------------------------------------------------
// EngineStatus / EngineUnavailable
// ---------------------------------------------------------------------------

/// Load state of one engine kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Nobody has asked for the engine yet.
    NotLoaded,
    /// Loaded and serving requests.
    Ready,
    /// Loading failed; the reason is kept until [`EngineRegistry::reload`].
    Unavailable(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineStatus::Unavailable(_))
    }
}

/// The requested engine failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} engine unavailable: {reason}")]
pub struct EngineUnavailable {
    pub kind: EngineKind,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// EngineHandle
// ---------------------------------------------------------------------------

/// Shared handle to a loaded engine.
///
/// Cloning is cheap and every clone points at the same engine instance.
/// Engines that do not support concurrent inference carry a gate; callers
/// take an [`InferencePermit`] before each inference call.
pub struct EngineHandle<E: ?Sized> {
    engine: Arc<E>,
    gate: Option<Arc<AsyncMutex<()>>>,
}

impl<E: ?Sized> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            gate: self.gate.clone(),
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for EngineHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("serialized", &self.gate.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: ?Sized + Engine> EngineHandle<E> {
    /// Wrap a freshly loaded engine.
    pub fn new(engine: Arc<E>) -> Self {
        let gate = (!engine.supports_concurrent_inference()).then(|| Arc::new(AsyncMutex::new(())));
        Self { engine, gate }
    }
}

impl<E: ?Sized> EngineHandle<E> {
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// `true` when both handles point at the same engine instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }

    /// `true` when inference on this engine is serialised.
    pub fn is_serialized(&self) -> bool {
        self.gate.is_some()
    }

    /// Wait for the right to run one inference call.
    ///
    /// Resolves immediately for engines that allow concurrent inference.
    /// The permit is owned, so it can be moved into a blocking task.
    pub async fn permit(&self) -> InferencePermit {
        match &self.gate {
            Some(gate) => InferencePermit(Some(Arc::clone(gate).lock_owned().await)),
            None => InferencePermit(None),
        }
    }
}

/// Held for the duration of one inference call; releases the gate on drop.
#[must_use]
pub struct InferencePermit(#[allow(dead_code)] Option<OwnedMutexGuard<()>>);

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

enum Loaded<E: ?Sized> {
    Ready(EngineHandle<E>),
    Unavailable(String),
}

impl<E: ?Sized> Loaded<E> {
    fn to_result(&self, kind: EngineKind) -> Result<EngineHandle<E>, EngineUnavailable> {
        match self {
            Loaded::Ready(handle) => Ok(handle.clone()),
            Loaded::Unavailable(reason) => Err(EngineUnavailable {
                kind,
                reason: reason.clone(),
            }),
        }
    }
}

/// One engine kind's cell.  The outer mutex only guards swapping the cell on
/// reload and is never held across an `.await`.
struct Slot<E: ?Sized> {
    cell: Mutex<Arc<OnceCell<Loaded<E>>>>,
}

impl<E: ?Sized> Slot<E> {
    fn new() -> Self {
        Self {
            cell: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    fn current(&self) -> Arc<OnceCell<Loaded<E>>> {
        Arc::clone(&self.cell.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn reset(&self) {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(OnceCell::new());
    }

    fn status(&self) -> EngineStatus {
        match self.current().get() {
            None => EngineStatus::NotLoaded,
            Some(Loaded::Ready(_)) => EngineStatus::Ready,
            Some(Loaded::Unavailable(reason)) => EngineStatus::Unavailable(reason.clone()),
        }
    }
}

type LoadFn<E> = fn(&dyn EngineLoader) -> Result<Arc<E>, EngineError>;

// ---------------------------------------------------------------------------
// EngineRegistry
// ---------------------------------------------------------------------------

/// Owns the three engines for the lifetime of the process.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_translator::config::AppConfig;
/// use voice_translator::engine::{ConfiguredLoader, EngineRegistry};
///
/// # async fn example() {
/// let registry = EngineRegistry::new(Arc::new(ConfiguredLoader::new(AppConfig::default())));
/// match registry.translation().await {
///     Ok(handle) => println!("translation engine: {}", handle.engine().name()),
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
pub struct EngineRegistry {
    loader: Arc<dyn EngineLoader>,
    transcription: Slot<dyn TranscriptionEngine>,
    translation: Slot<dyn TranslationEngine>,
    synthesis: Slot<dyn SynthesisEngine>,
}

impl EngineRegistry {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            transcription: Slot::new(),
            translation: Slot::new(),
            synthesis: Slot::new(),
        }
    }

    /// Handle to the transcription engine, loading it on first use.
    pub async fn transcription(
        &self,
    ) -> Result<EngineHandle<dyn TranscriptionEngine>, EngineUnavailable> {
        self.acquire(&self.transcription, EngineKind::Transcription, |l| {
            l.load_transcription()
        })
        .await
    }

    /// Handle to the translation engine, loading it on first use.
    pub async fn translation(
        &self,
    ) -> Result<EngineHandle<dyn TranslationEngine>, EngineUnavailable> {
        self.acquire(&self.translation, EngineKind::Translation, |l| {
            l.load_translation()
        })
        .await
    }

    /// Handle to the synthesis engine, loading it on first use.
    pub async fn synthesis(&self) -> Result<EngineHandle<dyn SynthesisEngine>, EngineUnavailable> {
        self.acquire(&self.synthesis, EngineKind::Synthesis, |l| l.load_synthesis())
            .await
    }

    /// Make sure the engine of `kind` has been loaded and report the result.
    pub async fn get_engine(&self, kind: EngineKind) -> EngineStatus {
        let loaded = match kind {
            EngineKind::Transcription => self.transcription().await.map(drop),
            EngineKind::Translation => self.translation().await.map(drop),
            EngineKind::Synthesis => self.synthesis().await.map(drop),
        };
        match loaded {
            Ok(()) => EngineStatus::Ready,
            Err(e) => EngineStatus::Unavailable(e.reason),
        }
    }

    /// Load every engine kind, one after the other.
    pub async fn preload(&self) -> BTreeMap<EngineKind, EngineStatus> {
        let mut report = BTreeMap::new();
        for kind in EngineKind::ALL {
            report.insert(kind, self.get_engine(kind).await);
        }
        report
    }

    /// Current state of every engine kind without triggering any load.
    pub fn status(&self) -> BTreeMap<EngineKind, EngineStatus> {
        EngineKind::ALL
            .into_iter()
            .map(|kind| (kind, self.status_of(kind)))
            .collect()
    }

    pub fn status_of(&self, kind: EngineKind) -> EngineStatus {
        match kind {
            EngineKind::Transcription => self.transcription.status(),
            EngineKind::Translation => self.translation.status(),
            EngineKind::Synthesis => self.synthesis.status(),
        }
    }

    /// Kinds whose load attempt failed.
    pub fn unavailable(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|&kind| self.status_of(kind).is_unavailable())
            .collect()
    }

    /// Forget the cached engine (or failure) of `kind`.
    pub fn reload(&self, kind: EngineKind) {
        log::info!("engine registry: reload requested for {kind} engine");
        match kind {
            EngineKind::Transcription => self.transcription.reset(),
            EngineKind::Translation => self.translation.reset(),
            EngineKind::Synthesis => self.synthesis.reset(),
        }
    }

    async fn acquire<E>(
        &self,
        slot: &Slot<E>,
        kind: EngineKind,
        load: LoadFn<E>,
    ) -> Result<EngineHandle<E>, EngineUnavailable>
    where
        E: ?Sized + Engine + 'static,
    {
        let cell = slot.current();
        if let Some(loaded) = cell.get() {
            return loaded.to_result(kind);
        }

        // The cell is initialised from a detached task: a caller dropped
        // mid-load leaves the load running and later callers wait on it.
        let loader = Arc::clone(&self.loader);
        let waiter = tokio::spawn(async move {
            cell.get_or_init(|| load_engine(loader, kind, load))
                .await
                .to_result(kind)
        });

        match waiter.await {
            Ok(result) => result,
            Err(e) => {
                log::error!("engine registry: {kind} load task failed: {e}");
                Err(EngineUnavailable {
                    kind,
                    reason: format!("load task failed: {e}"),
                })
            }
        }
    }
}

/// Run one loader method on the blocking pool and turn the outcome into a
/// slot value.
async fn load_engine<E>(loader: Arc<dyn EngineLoader>, kind: EngineKind, load: LoadFn<E>) -> Loaded<E>
where
    E: ?Sized + Engine + 'static,
{
    log::info!("engine registry: loading {kind} engine");
    let started = Instant::now();

    match tokio::task::spawn_blocking(move || load(loader.as_ref())).await {
        Ok(Ok(engine)) => {
            log::info!(
                "engine registry: {kind} engine '{}' ready in {} ms",
                engine.name(),
                started.elapsed().as_millis()
            );
            Loaded::Ready(EngineHandle::new(engine))
        }
        Ok(Err(e)) => {
            log::warn!("engine registry: {kind} engine unavailable: {e}");
            Loaded::Unavailable(e.to_string())
        }
        Err(e) => {
            log::error!("engine registry: {kind} loader task failed: {e}");
            Loaded::Unavailable(format!("loader task failed: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
