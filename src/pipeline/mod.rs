//! Translation pipeline: stage adapters, the orchestrator that sequences
//! them, and the per-mode result cache.
//!
//! # Architecture
//!
//! ```text
//! PipelineRequest { direction, payload }
//!        │
//!        ▼
//! PipelineOrchestrator::run()
//!        │
//!        ├─ [voice] AudioDecoder::decode ─▶ stages::transcribe  (spawn_blocking)
//!        ├─ stages::translate   (truncate to budget, beam search)
//!        └─ stages::synthesize  (VoicePolicy for languages without a voice)
//!        │
//!        ▼
//! PipelineResult { transcription?, translation, synthesis, elapsed }
//!        │
//!        ▼
//! ResultCache (last result per Mode)
//! ```
//!
//! Each stage asks the [`EngineRegistry`](crate::engine::EngineRegistry) for
//! its engine just before it runs.  A failure stops the pipeline; the stages
//! after it are reported as [`StageOutcome::NotAttempted`].

pub mod cache;
pub mod outcome;
pub mod request;
pub mod runner;
pub mod stages;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cache::ResultCache;
pub use outcome::{
    ErrorKind, PipelineResult, PipelineStatus, Stage, StageError, StageOutcome, SynthesizedSpeech,
};
pub use request::{Mode, Payload, PipelineRequest};
pub use runner::PipelineOrchestrator;
pub use stages::StageSettings;
pub use state::PipelineState;
