//! Test doubles for the three engines and the loader.
//!
//! Each mock records what it was asked so tests can check routing (language
//! tags, truncation, decoding policy) without a model file or a server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::audio::{encode_wav, DecodedAudio};

use super::{
    DecodingParams, Engine, EngineError, EngineKind, EngineLoader, SynthesisEngine,
    TranscriptionEngine, TranslationEngine,
};

// ---------------------------------------------------------------------------
// MockTranscriber
// ---------------------------------------------------------------------------

pub struct MockTranscriber {
    response: Result<String, EngineError>,
    languages: Mutex<Vec<String>>,
    samples_seen: Mutex<Vec<usize>>,
}

impl MockTranscriber {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::with_response(Ok(text.into()))
    }

    pub fn err(error: EngineError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<String, EngineError>) -> Self {
        Self {
            response,
            languages: Mutex::new(Vec::new()),
            samples_seen: Mutex::new(Vec::new()),
        }
    }

    /// Language tags passed to each call, in order.
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }

    /// Sample counts of each call, in order.
    pub fn samples_seen(&self) -> Vec<usize> {
        self.samples_seen.lock().unwrap().clone()
    }
}

impl Engine for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }
}

impl TranscriptionEngine for MockTranscriber {
    fn transcribe(&self, audio: &DecodedAudio, language: &str) -> Result<String, EngineError> {
        self.languages.lock().unwrap().push(language.to_string());
        self.samples_seen.lock().unwrap().push(audio.samples.len());
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// MockTranslator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateCall {
    pub text: String,
    pub source: String,
    pub target: String,
    pub decoding: DecodingParams,
}

enum Reply {
    /// `"<target tag>: <text>"`
    Echo,
    Fixed(String),
    Fail(EngineError),
}

pub struct MockTranslator {
    reply: Reply,
    concurrent: bool,
    delay_ms: u64,
    calls: Mutex<Vec<TranslateCall>>,
}

impl MockTranslator {
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fixed(text.into()))
    }

    pub fn err(error: EngineError) -> Self {
        Self::with_reply(Reply::Fail(error))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            concurrent: false,
            delay_ms: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Declare the mock safe for overlapping inference.
    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }

    /// Make every call take `ms` milliseconds.
    pub fn slow(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Engine for MockTranslator {
    fn name(&self) -> &str {
        "mock-translator"
    }

    fn supports_concurrent_inference(&self) -> bool {
        self.concurrent
    }
}

#[async_trait]
impl TranslationEngine for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
        decoding: &DecodingParams,
    ) -> Result<String, EngineError> {
        self.calls.lock().unwrap().push(TranslateCall {
            text: text.to_string(),
            source: source_tag.to_string(),
            target: target_tag.to_string(),
            decoding: *decoding,
        });
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        match &self.reply {
            Reply::Echo => Ok(format!("{target_tag}: {text}")),
            Reply::Fixed(s) => Ok(s.clone()),
            Reply::Fail(e) => Err(e.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer
// ---------------------------------------------------------------------------

pub struct MockSynthesizer {
    response: Result<Vec<u8>, EngineError>,
    voices: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    /// Answers with 0.1 s of 16 kHz silence as WAV.
    pub fn wav() -> Self {
        let bytes = encode_wav(&DecodedAudio::new(vec![0.0; 1_600], 16_000)).unwrap();
        Self::with_response(Ok(bytes))
    }

    pub fn empty() -> Self {
        Self::with_response(Ok(Vec::new()))
    }

    pub fn err(error: EngineError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<Vec<u8>, EngineError>) -> Self {
        Self {
            response,
            voices: Mutex::new(Vec::new()),
        }
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

impl Engine for MockSynthesizer {
    fn name(&self) -> &str {
        "mock-synthesizer"
    }
}

#[async_trait]
impl SynthesisEngine for MockSynthesizer {
    async fn synthesize(&self, _text: &str, voice_tag: &str) -> Result<Vec<u8>, EngineError> {
        self.voices.lock().unwrap().push(voice_tag.to_string());
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// MockLoader
// ---------------------------------------------------------------------------

/// Loader handing out fixed mock instances and counting load calls.
pub struct MockLoader {
    transcription: Result<Arc<MockTranscriber>, EngineError>,
    translation: Result<Arc<MockTranslator>, EngineError>,
    synthesis: Result<Arc<MockSynthesizer>, EngineError>,
    delay_ms: u64,
    loads: [AtomicUsize; 3],
}

impl MockLoader {
    /// Every engine loads: a transcriber that hears French, an echoing
    /// translator and a synthesizer returning a short WAV.
    pub fn healthy() -> Self {
        Self {
            transcription: Ok(Arc::new(MockTranscriber::ok("bonjour tout le monde"))),
            translation: Ok(Arc::new(MockTranslator::echo())),
            synthesis: Ok(Arc::new(MockSynthesizer::wav())),
            delay_ms: 0,
            loads: Default::default(),
        }
    }

    pub fn with_transcriber(mut self, engine: Arc<MockTranscriber>) -> Self {
        self.transcription = Ok(engine);
        self
    }

    pub fn with_translator(mut self, engine: Arc<MockTranslator>) -> Self {
        self.translation = Ok(engine);
        self
    }

    pub fn with_synthesizer(mut self, engine: Arc<MockSynthesizer>) -> Self {
        self.synthesis = Ok(engine);
        self
    }

    /// Make loading `kind` fail with `ModelNotFound`.
    pub fn failing(mut self, kind: EngineKind) -> Self {
        let err = EngineError::ModelNotFound(format!("mock {kind} model"));
        match kind {
            EngineKind::Transcription => self.transcription = Err(err),
            EngineKind::Translation => self.translation = Err(err),
            EngineKind::Synthesis => self.synthesis = Err(err),
        }
        self
    }

    /// Make every load block for `ms` milliseconds.
    pub fn with_load_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn loads(&self, kind: EngineKind) -> usize {
        self.loads[Self::index(kind)].load(Ordering::SeqCst)
    }

    pub fn total_loads(&self) -> usize {
        EngineKind::ALL.iter().map(|&k| self.loads(k)).sum()
    }

    fn index(kind: EngineKind) -> usize {
        match kind {
            EngineKind::Transcription => 0,
            EngineKind::Translation => 1,
            EngineKind::Synthesis => 2,
        }
    }

    fn record(&self, kind: EngineKind) {
        self.loads[Self::index(kind)].fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
        }
    }
}

impl EngineLoader for MockLoader {
    fn load_transcription(&self) -> Result<Arc<dyn TranscriptionEngine>, EngineError> {
        self.record(EngineKind::Transcription);
        self.transcription
            .clone()
            .map(|e| e as Arc<dyn TranscriptionEngine>)
    }

    fn load_translation(&self) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        self.record(EngineKind::Translation);
        self.translation
            .clone()
            .map(|e| e as Arc<dyn TranslationEngine>)
    }

    fn load_synthesis(&self) -> Result<Arc<dyn SynthesisEngine>, EngineError> {
        self.record(EngineKind::Synthesis);
        self.synthesis.clone().map(|e| e as Arc<dyn SynthesisEngine>)
    }
}
