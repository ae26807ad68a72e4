//! Stage adapters: one inference call each, wrapped with input validation and
//! error normalisation.
//!
//! Every adapter validates its input *before* asking the registry for an
//! engine, so blank input never triggers a model load.  Engine errors come
//! back as [`StageError`]s of the stage's failure kind.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::DecodedAudio;
use crate::config::{AppConfig, VoicePolicy};
use crate::engine::{DecodingParams, EngineKind, EngineRegistry, EngineUnavailable};
use crate::language::resolver::engine_language_tag;
use crate::language::{Direction, LanguageCode};

use super::outcome::{ErrorKind, StageError, SynthesizedSpeech};

// ---------------------------------------------------------------------------
// StageSettings
// ---------------------------------------------------------------------------

/// Knobs the adapters read on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    /// Translation input budget, in whitespace-separated tokens.
    pub max_input_tokens: usize,
    pub decoding: DecodingParams,
    pub voice_policy: VoicePolicy,
    /// Upper bound on one inference call, including the wait for the engine's
    /// inference permit.  Engine loading is not counted.
    pub stage_timeout: Option<Duration>,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            max_input_tokens: 512,
            decoding: DecodingParams::default(),
            voice_policy: VoicePolicy::default(),
            stage_timeout: None,
        }
    }
}

impl StageSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_input_tokens: config.translation.max_input_tokens,
            decoding: config.translation.decoding,
            voice_policy: config.synthesis.voice_policy,
            stage_timeout: config.pipeline.stage_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unavailable(e: EngineUnavailable) -> StageError {
    StageError::new(ErrorKind::EngineUnavailable, e.to_string())
}

/// Run `work` under the optional stage timeout.  Expiry becomes a `kind`
/// failure; work already handed to the blocking pool keeps running.
async fn bounded<T, F>(timeout: Option<Duration>, kind: ErrorKind, work: F) -> Result<T, StageError>
where
    F: Future<Output = Result<T, StageError>>,
{
    match timeout {
        None => work.await,
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("pipeline: {kind} timed out after {} s", limit.as_secs_f32());
                Err(StageError::new(
                    kind,
                    format!("timed out after {} s", limit.as_secs_f32()),
                ))
            }
        },
    }
}

/// Characters per subword piece assumed when estimating token counts.
const CHARS_PER_TOKEN: usize = 4;

/// Estimated subword tokens for one whitespace-separated word: one per
/// started [`CHARS_PER_TOKEN`] characters, at least one.
fn estimated_tokens(word: &str) -> usize {
    word.chars().count().div_ceil(CHARS_PER_TOKEN).max(1)
}

/// Keep the leading words of `text` whose estimated subword token count
/// fits in `max_tokens`.  The first word is always kept.
///
/// Returns the input unchanged (borrowed) when it fits.
///
/// ```
/// use voice_translator::pipeline::stages::truncate_to_budget;
///
/// assert_eq!(truncate_to_budget("un deux trois", 2), "un deux");
/// assert_eq!(truncate_to_budget("un deux", 2), "un deux");
/// ```
pub fn truncate_to_budget(text: &str, max_tokens: usize) -> Cow<'_, str> {
    let mut used = 0;
    let mut kept = Vec::new();
    for word in text.split_whitespace() {
        used += estimated_tokens(word);
        if used > max_tokens && !kept.is_empty() {
            return Cow::Owned(kept.join(" "));
        }
        kept.push(word);
    }
    Cow::Borrowed(text)
}

// ---------------------------------------------------------------------------
// Transcribe
// ---------------------------------------------------------------------------

/// Speech → text in `language`.
///
/// Whisper inference is blocking and runs on the blocking pool; the
/// inference permit moves with it, so a timed-out call still holds the
/// engine until it finishes.
pub async fn transcribe(
    registry: &EngineRegistry,
    audio: DecodedAudio,
    language: LanguageCode,
    settings: &StageSettings,
) -> Result<String, StageError> {
    if audio.is_empty() {
        return Err(StageError::new(ErrorKind::EmptyAudio, "no audio samples"));
    }

    let handle = registry.transcription().await.map_err(unavailable)?;
    let tag = engine_language_tag(language, EngineKind::Transcription);
    if tag.substitute {
        log::debug!(
            "pipeline: no {language} transcription model, using \"{}\"",
            tag.tag
        );
    }

    bounded(settings.stage_timeout, ErrorKind::TranscriptionFailure, async move {
        let permit = handle.permit().await;
        let engine = Arc::clone(handle.engine());
        log::debug!(
            "pipeline: transcribing {:.2} s with {}",
            audio.duration_secs(),
            engine.name()
        );

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.transcribe(&audio, tag.tag)
        })
        .await;

        match joined {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(e)) => Err(StageError::new(ErrorKind::TranscriptionFailure, e.to_string())),
            Err(e) => Err(StageError::new(
                ErrorKind::TranscriptionFailure,
                format!("transcription task failed: {e}"),
            )),
        }
    })
    .await
}

// ---------------------------------------------------------------------------
// Translate
// ---------------------------------------------------------------------------

/// Text in `direction.source()` → text in `direction.target()`.
pub async fn translate(
    registry: &EngineRegistry,
    text: &str,
    direction: Direction,
    settings: &StageSettings,
) -> Result<String, StageError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StageError::new(ErrorKind::EmptyInput, "nothing to translate"));
    }

    let handle = registry.translation().await.map_err(unavailable)?;

    let input = truncate_to_budget(text, settings.max_input_tokens);
    if matches!(input, Cow::Owned(_)) {
        log::warn!(
            "pipeline: translation input truncated to an estimated {} tokens",
            settings.max_input_tokens
        );
    }

    let source = engine_language_tag(direction.source(), EngineKind::Translation).tag;
    let target = engine_language_tag(direction.target(), EngineKind::Translation).tag;

    let translated = bounded(settings.stage_timeout, ErrorKind::TranslationFailure, async {
        let _permit = handle.permit().await;
        handle
            .engine()
            .translate(&input, source, target, &settings.decoding)
            .await
            .map_err(|e| StageError::new(ErrorKind::TranslationFailure, e.to_string()))
    })
    .await?;

    let translated = translated.trim();
    if translated.is_empty() {
        return Err(StageError::new(
            ErrorKind::TranslationFailure,
            "engine returned an empty translation",
        ));
    }
    Ok(translated.to_string())
}

// ---------------------------------------------------------------------------
// Synthesize
// ---------------------------------------------------------------------------

/// Text → speech in `target`.
///
/// When `target` has no voice of its own the [`VoicePolicy`] decides
/// between speaking with the substitute voice and failing with
/// [`ErrorKind::UnsupportedVoice`].  A substitution is recorded in
/// [`SynthesizedSpeech::substituted_for`].
pub async fn synthesize(
    registry: &EngineRegistry,
    text: &str,
    target: LanguageCode,
    settings: &StageSettings,
) -> Result<SynthesizedSpeech, StageError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StageError::new(ErrorKind::EmptyInput, "nothing to synthesize"));
    }

    let tag = engine_language_tag(target, EngineKind::Synthesis);
    if tag.substitute {
        match settings.voice_policy {
            VoicePolicy::Reject => {
                return Err(StageError::new(
                    ErrorKind::UnsupportedVoice,
                    format!("no {target} voice available"),
                ));
            }
            VoicePolicy::Substitute => {
                log::warn!("pipeline: no {target} voice, speaking with \"{}\"", tag.tag);
            }
        }
    }

    let handle = registry.synthesis().await.map_err(unavailable)?;

    let audio = bounded(settings.stage_timeout, ErrorKind::SynthesisFailure, async {
        let _permit = handle.permit().await;
        handle
            .engine()
            .synthesize(text, tag.tag)
            .await
            .map_err(|e| StageError::new(ErrorKind::SynthesisFailure, e.to_string()))
    })
    .await?;

    if audio.is_empty() {
        return Err(StageError::new(
            ErrorKind::SynthesisFailure,
            "engine returned no audio",
        ));
    }

    Ok(SynthesizedSpeech {
        audio,
        voice_tag: tag.tag.to_string(),
        substituted_for: tag.substitute.then_some(target),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
