//! Pipeline orchestrator: runs one request through its stages.
//!
//! # Pipeline flow
//!
//! ```text
//! Voice: WAV bytes ─decode─▶ transcribe ─▶ translate ─▶ synthesize ─▶ Done
//! Text:                       text      ─▶ translate ─▶ synthesize ─▶ Done
//!
//! any Failure ─▶ Aborted; later stages are NotAttempted
//! ```
//!
//! Stages run strictly one after another.  Each stage asks the
//! [`EngineRegistry`] for its engine right before it runs.

use std::sync::Arc;
use std::time::Instant;

use crate::audio::{AudioDecoder, DecodedAudio};
use crate::engine::EngineRegistry;
use crate::language::{Direction, LanguageCode};

use super::outcome::{ErrorKind, PipelineResult, StageError, StageOutcome, SynthesizedSpeech};
use super::request::{Mode, Payload, PipelineRequest};
use super::stages::{self, StageSettings};
use super::state::PipelineState;

/// Sequences the stage adapters for one request at a time.
///
/// Cheap to share behind an `Arc`; concurrent `run` calls share the
/// registry and therefore the engines.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_translator::audio::WavDecoder;
/// use voice_translator::config::AppConfig;
/// use voice_translator::engine::{ConfiguredLoader, EngineRegistry};
/// use voice_translator::language::DirectionResolver;
/// use voice_translator::pipeline::{PipelineOrchestrator, PipelineRequest, StageSettings};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let registry = Arc::new(EngineRegistry::new(Arc::new(ConfiguredLoader::new(config.clone()))));
/// let orchestrator = PipelineOrchestrator::new(
///     registry,
///     Arc::new(WavDecoder::default()),
///     StageSettings::from_config(&config),
/// );
///
/// let direction = DirectionResolver::resolve("French → Mooré").unwrap();
/// let result = orchestrator.run(&PipelineRequest::text(direction, "Bonjour")).await;
/// println!("{:?}", result.status());
/// # }
/// ```
pub struct PipelineOrchestrator {
    registry: Arc<EngineRegistry>,
    decoder: Arc<dyn AudioDecoder>,
    settings: StageSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: Arc<EngineRegistry>,
        decoder: Arc<dyn AudioDecoder>,
        settings: StageSettings,
    ) -> Self {
        Self {
            registry,
            decoder,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Run `request` to `Done` or `Aborted`.  Never fails: every problem is
    /// reported as a stage outcome in the returned result.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineResult {
        let started = Instant::now();
        let mode = request.mode();
        let direction = request.direction();
        let mut run = Run::new(mode, direction, started);

        log::debug!("pipeline: {mode} request, {direction}");

        // ── 1. Transcription (voice only) ────────────────────────────────
        let source_text = match request.payload() {
            Payload::Audio(bytes) => {
                run.advance();
                match self.transcribe_bytes(bytes, direction.source()).await {
                    Ok(text) => {
                        log::debug!("pipeline: transcript = {text:?}");
                        run.transcription = Some(StageOutcome::Success(text.clone()));
                        text
                    }
                    Err(e) => {
                        run.transcription = Some(StageOutcome::Failure(e));
                        return run.abort();
                    }
                }
            }
            Payload::Text(text) => text.clone(),
        };

        // ── 2. Translation ───────────────────────────────────────────────
        run.advance();
        let translated =
            match stages::translate(&self.registry, &source_text, direction, &self.settings).await {
                Ok(text) => {
                    log::debug!("pipeline: translation = {text:?}");
                    run.translation = StageOutcome::Success(text.clone());
                    text
                }
                Err(e) => {
                    run.translation = StageOutcome::Failure(e);
                    return run.abort();
                }
            };

        // ── 3. Synthesis ─────────────────────────────────────────────────
        run.advance();
        match stages::synthesize(&self.registry, &translated, direction.target(), &self.settings)
            .await
        {
            Ok(speech) => {
                log::debug!(
                    "pipeline: synthesized {} bytes with voice {:?}",
                    speech.audio.len(),
                    speech.voice_tag
                );
                run.synthesis = StageOutcome::Success(speech);
                run.advance();
                run.finish()
            }
            Err(e) => {
                run.synthesis = StageOutcome::Failure(e);
                run.abort()
            }
        }
    }

    /// Decode a recording and transcribe it.
    async fn transcribe_bytes(&self, bytes: &[u8], language: LanguageCode) -> Result<String, StageError> {
        if bytes.is_empty() {
            return Err(StageError::new(ErrorKind::EmptyAudio, "no audio provided"));
        }

        let audio: DecodedAudio = self
            .decoder
            .decode(bytes)
            .map_err(|e| StageError::new(ErrorKind::TranscriptionFailure, e.to_string()))?;

        stages::transcribe(&self.registry, audio, language, &self.settings).await
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Outcomes collected so far for one request.
struct Run {
    state: PipelineState,
    mode: Mode,
    direction: Direction,
    started: Instant,
    transcription: Option<StageOutcome<String>>,
    translation: StageOutcome<String>,
    synthesis: StageOutcome<SynthesizedSpeech>,
}

impl Run {
    fn new(mode: Mode, direction: Direction, started: Instant) -> Self {
        Self {
            state: PipelineState::Start,
            mode,
            direction,
            started,
            transcription: None,
            translation: StageOutcome::NotAttempted,
            synthesis: StageOutcome::NotAttempted,
        }
    }

    fn advance(&mut self) {
        let next = self.state.advance(self.mode);
        log::debug!("pipeline: {} → {}", self.state, next);
        self.state = next;
    }

    fn abort(mut self) -> PipelineResult {
        let failed = self.state;
        self.state = self.state.abort();
        log::debug!("pipeline: {failed} → {}", self.state);
        self.finish()
    }

    fn finish(self) -> PipelineResult {
        let result = PipelineResult {
            mode: self.mode,
            direction: self.direction,
            transcription: self.transcription,
            translation: self.translation,
            synthesis: self.synthesis,
            elapsed: self.started.elapsed(),
        };

        match result.failure() {
            None => log::info!(
                "pipeline: {} request {} done in {} ms",
                result.mode,
                result.direction,
                result.elapsed.as_millis()
            ),
            Some((stage, e)) => log::warn!(
                "pipeline: {} request {} aborted at {stage}: {e}",
                result.mode,
                result.direction
            ),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{encode_wav, WavDecoder};
    use crate::engine::mock::{MockLoader, MockSynthesizer, MockTranscriber, MockTranslator};
    use crate::engine::{EngineError, EngineKind, EngineLoader};
    use crate::language::DirectionResolver;
    use crate::pipeline::{PipelineStatus, Stage};

    fn orchestrator(loader: &Arc<MockLoader>) -> PipelineOrchestrator {
        let registry = Arc::new(EngineRegistry::new(Arc::clone(loader) as Arc<dyn EngineLoader>));
        PipelineOrchestrator::new(registry, Arc::new(WavDecoder::default()), StageSettings::default())
    }

    fn fr_to_mos() -> Direction {
        DirectionResolver::resolve("French → Mooré").unwrap()
    }

    /// `secs` of a 220 Hz tone at 44.1 kHz, WAV-encoded.
    fn clip(secs: f32) -> Vec<u8> {
        let n = (44_100.0 * secs) as usize;
        let samples = (0..n)
            .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / 44_100.0).sin() * 0.3)
            .collect();
        encode_wav(&DecodedAudio::new(samples, 44_100)).unwrap()
    }

    #[tokio::test]
    async fn voice_request_runs_all_three_stages() {
        let transcriber = Arc::new(MockTranscriber::ok("bonjour tout le monde"));
        let loader = Arc::new(MockLoader::healthy().with_transcriber(Arc::clone(&transcriber)));
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), clip(2.0))).await;

        assert_eq!(result.status(), PipelineStatus::Done);
        assert_eq!(result.mode, Mode::Voice);
        assert_eq!(result.transcript(), Some("bonjour tout le monde"));
        assert_eq!(result.translated_text(), Some("mos_Latn: bonjour tout le monde"));
        assert!(!result.speech().unwrap().audio.is_empty());
        // Decoded and resampled to 16 kHz before transcription.
        assert_eq!(transcriber.samples_seen(), [32_000]);
    }

    #[tokio::test]
    async fn empty_audio_stops_at_transcription() {
        let loader = Arc::new(MockLoader::healthy());
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), Vec::new())).await;

        let transcription = result.transcription.as_ref().unwrap();
        assert_eq!(transcription.error_kind(), Some(ErrorKind::EmptyAudio));
        assert!(result.translation.is_not_attempted());
        assert!(result.synthesis.is_not_attempted());
        assert_eq!(loader.total_loads(), 0);
    }

    #[tokio::test]
    async fn silent_wav_is_empty_audio() {
        let loader = Arc::new(MockLoader::healthy());
        let orc = orchestrator(&loader);
        let header_only = encode_wav(&DecodedAudio::new(Vec::new(), 16_000)).unwrap();

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), header_only)).await;
        assert_eq!(result.status(), PipelineStatus::Aborted(Stage::Transcription));
        assert_eq!(
            result.transcription.unwrap().error_kind(),
            Some(ErrorKind::EmptyAudio)
        );
    }

    #[tokio::test]
    async fn garbage_audio_is_transcription_failure() {
        let loader = Arc::new(MockLoader::healthy());
        let orc = orchestrator(&loader);

        let result = orc
            .run(&PipelineRequest::voice(fr_to_mos(), b"not a wav file".to_vec()))
            .await;
        assert_eq!(
            result.transcription.unwrap().error_kind(),
            Some(ErrorKind::TranscriptionFailure)
        );
    }

    #[tokio::test]
    async fn unavailable_transcriber_stops_voice_before_translation() {
        let loader = Arc::new(MockLoader::healthy().failing(EngineKind::Transcription));
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), clip(1.0))).await;

        assert_eq!(result.status(), PipelineStatus::Aborted(Stage::Transcription));
        assert_eq!(
            result.transcription.as_ref().unwrap().error_kind(),
            Some(ErrorKind::EngineUnavailable)
        );
        assert!(result.translation.is_not_attempted());
        assert!(result.synthesis.is_not_attempted());
        assert_eq!(loader.loads(EngineKind::Transcription), 1);
        assert_eq!(loader.loads(EngineKind::Translation), 0);
        assert_eq!(loader.loads(EngineKind::Synthesis), 0);
    }

    #[tokio::test]
    async fn blank_text_never_touches_an_engine() {
        let loader = Arc::new(MockLoader::healthy());
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::text(fr_to_mos(), "   ")).await;

        assert!(result.transcription.is_none());
        assert_eq!(result.translation.error_kind(), Some(ErrorKind::EmptyInput));
        assert!(result.synthesis.is_not_attempted());
        assert_eq!(loader.total_loads(), 0);
    }

    #[tokio::test]
    async fn synthesis_failure_keeps_earlier_outcomes() {
        let loader = Arc::new(MockLoader::healthy().failing(EngineKind::Synthesis));
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), clip(1.0))).await;

        assert_eq!(result.status(), PipelineStatus::Aborted(Stage::Synthesis));
        assert!(result.transcription.as_ref().unwrap().is_success());
        assert_eq!(result.translated_text(), Some("mos_Latn: bonjour tout le monde"));
        assert_eq!(result.synthesis.error_kind(), Some(ErrorKind::EngineUnavailable));
    }

    #[tokio::test]
    async fn translation_failure_marks_synthesis_not_attempted() {
        let loader = Arc::new(
            MockLoader::healthy()
                .with_translator(Arc::new(MockTranslator::err(EngineError::Timeout))),
        );
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::text(fr_to_mos(), "bonjour")).await;
        assert_eq!(result.translation.error_kind(), Some(ErrorKind::TranslationFailure));
        assert!(result.synthesis.is_not_attempted());
        assert_eq!(loader.loads(EngineKind::Synthesis), 0);
    }

    #[tokio::test]
    async fn empty_transcript_fails_translation_with_empty_input() {
        let loader = Arc::new(MockLoader::healthy().with_transcriber(Arc::new(MockTranscriber::ok(""))));
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::voice(fr_to_mos(), clip(0.5))).await;
        assert_eq!(result.transcript(), Some(""));
        assert_eq!(result.translation.error_kind(), Some(ErrorKind::EmptyInput));
    }

    #[tokio::test]
    async fn translated_text_containing_error_word_is_success() {
        let loader = Arc::new(
            MockLoader::healthy()
                .with_translator(Arc::new(MockTranslator::fixed("Error n'est pas une erreur"))),
        );
        let orc = orchestrator(&loader);

        let result = orc
            .run(&PipelineRequest::text(fr_to_mos().reversed(), "ne y windiga"))
            .await;
        assert!(result.is_done());
        assert_eq!(result.translated_text(), Some("Error n'est pas une erreur"));
    }

    #[tokio::test]
    async fn moore_target_is_spoken_with_substitute_voice() {
        let synth = Arc::new(MockSynthesizer::wav());
        let loader = Arc::new(MockLoader::healthy().with_synthesizer(Arc::clone(&synth)));
        let orc = orchestrator(&loader);

        let result = orc.run(&PipelineRequest::text(fr_to_mos(), "bonjour")).await;
        let speech = result.speech().unwrap();
        assert_eq!(speech.voice_tag, "en");
        assert_eq!(speech.substituted_for, Some(LanguageCode::Moore));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_engines() {
        let loader = Arc::new(MockLoader::healthy().with_load_delay_ms(30));
        let orc = Arc::new(orchestrator(&loader));

        let tasks: Vec<_> = (0..6)
            .map(|i| {
                let orc = Arc::clone(&orc);
                tokio::spawn(async move {
                    orc.run(&PipelineRequest::text(fr_to_mos(), format!("phrase {i}")))
                        .await
                })
            })
            .collect();

        for t in tasks {
            assert!(t.await.unwrap().is_done());
        }
        assert_eq!(loader.loads(EngineKind::Translation), 1);
        assert_eq!(loader.loads(EngineKind::Synthesis), 1);
        assert_eq!(loader.loads(EngineKind::Transcription), 0);
    }
}
