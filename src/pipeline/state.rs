//! Per-request state machine.

use super::outcome::Stage;
use super::request::Mode;

/// States a request moves through.
///
/// ```text
/// Start ──voice──▶ Transcribing ──▶ Translating ──▶ Synthesizing ──▶ Done
///       ──text────────────────────▶ Translating
/// any stage ──failure──▶ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Transcribing,
    Translating,
    Synthesizing,
    Done,
    Aborted,
}

impl PipelineState {
    /// The state after the current one completed successfully.
    ///
    /// ```
    /// use voice_translator::pipeline::{Mode, PipelineState};
    ///
    /// assert_eq!(PipelineState::Start.advance(Mode::Voice), PipelineState::Transcribing);
    /// assert_eq!(PipelineState::Start.advance(Mode::Text), PipelineState::Translating);
    /// assert_eq!(PipelineState::Synthesizing.advance(Mode::Text), PipelineState::Done);
    /// ```
    pub fn advance(self, mode: Mode) -> Self {
        match self {
            PipelineState::Start => match mode {
                Mode::Voice => PipelineState::Transcribing,
                Mode::Text => PipelineState::Translating,
            },
            PipelineState::Transcribing => PipelineState::Translating,
            PipelineState::Translating => PipelineState::Synthesizing,
            PipelineState::Synthesizing => PipelineState::Done,
            terminal => terminal,
        }
    }

    /// The state after the current stage failed.  Terminal states stay put.
    pub fn abort(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            PipelineState::Aborted
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }

    /// The stage running in this state, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Transcribing => Some(Stage::Transcription),
            PipelineState::Translating => Some(Stage::Translation),
            PipelineState::Synthesizing => Some(Stage::Synthesis),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Start => "Start",
            PipelineState::Transcribing => "Transcribing",
            PipelineState::Translating => "Translating",
            PipelineState::Synthesizing => "Synthesizing",
            PipelineState::Done => "Done",
            PipelineState::Aborted => "Aborted",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Start
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
