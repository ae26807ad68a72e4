//! Local Whisper transcription (whisper-rs).
//!
//! [`WhisperParams`] is always available so configuration files parse the
//! same way in every build.  [`WhisperTranscriber`] itself needs the
//! `whisper` cargo feature, which pulls in whisper.cpp.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Owned mirror of `whisper_rs::SamplingStrategy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Single-pass decoding.
    Greedy {
        /// Candidates evaluated per step.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        beam_size: i32,
        /// ≥ 1.0 is standard beam search.
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// WhisperParams
// ---------------------------------------------------------------------------

/// Per-engine inference settings.  The language is chosen per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperParams {
    /// CPU threads handed to whisper.cpp; `0` picks [`optimal_threads`].
    pub n_threads: i32,
    /// Keep whisper.cpp quiet on stderr.
    pub suppress_progress: bool,
    pub strategy: SamplingStrategy,
}

impl Default for WhisperParams {
    fn default() -> Self {
        Self {
            n_threads: 0,
            suppress_progress: true,
            strategy: SamplingStrategy::default(),
        }
    }
}

impl WhisperParams {
    pub fn threads(&self) -> i32 {
        if self.n_threads > 0 {
            self.n_threads
        } else {
            optimal_threads()
        }
    }
}

/// Available parallelism capped at 8; Whisper gains little beyond that.
pub fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// WhisperTranscriber
// ---------------------------------------------------------------------------

#[cfg(feature = "whisper")]
pub use imp::WhisperTranscriber;

#[cfg(feature = "whisper")]
mod imp {
    use std::path::Path;

    use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

    use super::{SamplingStrategy, WhisperParams};
    use crate::audio::{DecodedAudio, TARGET_SAMPLE_RATE};
    use crate::engine::{Engine, EngineError, TranscriptionEngine};

    /// Whisper model loaded once; a fresh `WhisperState` per call lets
    /// transcriptions overlap without locking.
    pub struct WhisperTranscriber {
        ctx: WhisperContext,
        params: WhisperParams,
        name: String,
    }

    impl std::fmt::Debug for WhisperTranscriber {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WhisperTranscriber")
                .field("name", &self.name)
                .field("params", &self.params)
                .finish_non_exhaustive()
        }
    }

    // SAFETY: whisper-rs declares WhisperContext Send + Sync; the weights are
    // read-only after loading and every call creates its own state.
    unsafe impl Send for WhisperTranscriber {}
    unsafe impl Sync for WhisperTranscriber {}

    impl WhisperTranscriber {
        /// Load a GGML model file.
        ///
        /// # Errors
        ///
        /// - [`EngineError::ModelNotFound`]: `model_path` does not exist.
        /// - [`EngineError::Init`]: whisper.cpp rejected the file.
        pub fn load(model_path: impl AsRef<Path>, params: WhisperParams) -> Result<Self, EngineError> {
            let path = model_path.as_ref();
            if !path.exists() {
                return Err(EngineError::ModelNotFound(path.display().to_string()));
            }

            let path_str = path.to_str().ok_or_else(|| {
                EngineError::ModelNotFound(format!(
                    "model path contains non-UTF-8 characters: {}",
                    path.display()
                ))
            })?;

            let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| EngineError::Init(e.to_string()))?;

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("model");

            Ok(Self {
                ctx,
                params,
                name: format!("whisper:{stem}"),
            })
        }
    }

    impl Engine for WhisperTranscriber {
        fn name(&self) -> &str {
            &self.name
        }

        fn supports_concurrent_inference(&self) -> bool {
            true
        }
    }

    impl TranscriptionEngine for WhisperTranscriber {
        fn transcribe(&self, audio: &DecodedAudio, language: &str) -> Result<String, EngineError> {
            if audio.sample_rate != TARGET_SAMPLE_RATE {
                return Err(EngineError::Inference(format!(
                    "whisper expects {TARGET_SAMPLE_RATE} Hz audio, got {} Hz",
                    audio.sample_rate
                )));
            }

            use whisper_rs::SamplingStrategy as WS;
            let ws = match self.params.strategy {
                SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
                SamplingStrategy::BeamSearch {
                    beam_size,
                    patience,
                } => WS::BeamSearch {
                    beam_size,
                    patience,
                },
            };

            let mut fp = FullParams::new(ws);
            fp.set_language(if language == "auto" { None } else { Some(language) });
            fp.set_n_threads(self.params.threads());
            if self.params.suppress_progress {
                fp.set_print_progress(false);
                fp.set_print_realtime(false);
            }

            let mut state = self
                .ctx
                .create_state()
                .map_err(|e| EngineError::Init(e.to_string()))?;

            state
                .full(fp, &audio.samples)
                .map_err(|e| EngineError::Inference(e.to_string()))?;

            let n_segments = state
                .full_n_segments()
                .map_err(|e| EngineError::Inference(e.to_string()))?;

            let mut text = String::new();
            for i in 0..n_segments {
                let segment = state
                    .full_get_segment_text(i)
                    .map_err(|e| EngineError::Inference(format!("segment {i}: {e}")))?;
                text.push_str(&segment);
            }

            Ok(text.trim().to_string())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_greedy_single_pass() {
        assert_eq!(SamplingStrategy::default(), SamplingStrategy::Greedy { best_of: 1 });
    }

    #[test]
    fn zero_threads_means_auto() {
        let t = WhisperParams::default().threads();
        assert!((1..=8).contains(&t));

        let fixed = WhisperParams {
            n_threads: 3,
            ..WhisperParams::default()
        };
        assert_eq!(fixed.threads(), 3);
    }

    #[test]
    fn params_round_trip_through_toml() {
        let params = WhisperParams {
            strategy: SamplingStrategy::BeamSearch {
                beam_size: 5,
                patience: 1.0,
            },
            n_threads: 2,
            suppress_progress: false,
        };
        let text = toml::to_string(&params).unwrap();
        let back: WhisperParams = toml::from_str(&text).unwrap();
        assert_eq!(back, params);
    }
}
