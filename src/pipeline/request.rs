//! Pipeline input.

use crate::language::{Direction, DirectionResolver, ResolveError};

/// Which pipeline a request runs through.  Derived from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Speech in, speech out: transcribe → translate → synthesize.
    Voice,
    /// Text in, speech out: translate → synthesize.
    Text,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Voice => "voice",
            Mode::Text => "text",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller hands in.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An encoded recording (WAV).
    Audio(Vec<u8>),
    Text(String),
}

/// One translation request.  Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    direction: Direction,
    payload: Payload,
}

impl PipelineRequest {
    pub fn new(direction: Direction, payload: Payload) -> Self {
        Self { direction, payload }
    }

    /// Speech request from encoded audio bytes.
    pub fn voice(direction: Direction, audio: impl Into<Vec<u8>>) -> Self {
        Self::new(direction, Payload::Audio(audio.into()))
    }

    /// Text request.
    pub fn text(direction: Direction, text: impl Into<String>) -> Self {
        Self::new(direction, Payload::Text(text.into()))
    }

    /// Build a request from a direction selector label.
    pub fn with_label(label: &str, payload: Payload) -> Result<Self, ResolveError> {
        Ok(Self::new(DirectionResolver::resolve(label)?, payload))
    }

    pub fn mode(&self) -> Mode {
        match self.payload {
            Payload::Audio(_) => Mode::Voice,
            Payload::Text(_) => Mode::Text,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}
