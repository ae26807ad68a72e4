//! Configuration for the voice translator.
//!
//! Provides `AppConfig` (top-level settings), one section per engine plus
//! pipeline settings, `AppPaths` for cross-platform directories,
//! and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, PipelineConfig, SynthesisConfig, TranscriptionConfig,
    TranslationConfig, VoicePolicy,
};
