//! French ↔ Mooré voice translator.
//!
//! Chains three engines (speech-to-text, translation, text-to-speech) into a
//! pipeline that takes either a recording or text in one language and
//! returns synthesised speech in the other.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`language`] | Language codes, directions, per-engine language tags      |
//! | [`audio`]    | WAV decoding to 16 kHz mono `f32`, WAV encoding           |
//! | [`engine`]   | Engine traits, Whisper / HTTP engines, [`EngineRegistry`] |
//! | [`pipeline`] | Stage adapters, orchestrator, typed outcomes, cache       |
//! | [`config`]   | `settings.toml` persistence                               |
//!
//! [`Translator`] is the entry point for callers.
//!
//! [`EngineRegistry`]: engine::EngineRegistry

pub mod audio;
pub mod config;
pub mod engine;
pub mod language;
pub mod pipeline;
pub mod translator;

pub use translator::Translator;
