//! WAV decoding into engine-ready samples, and WAV encoding for exports.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

use super::resample::{downmix, resample};

/// Sample rate every transcription engine in this crate expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors raised while turning recordings into samples and back.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The bytes are not a readable WAV stream.
    #[error("cannot decode audio: {0}")]
    Decode(String),

    /// The header declares a layout we cannot convert (e.g. zero channels).
    #[error("unsupported audio layout: {0}")]
    Unsupported(String),

    /// Sample-rate conversion failed.
    #[error("cannot resample audio: {0}")]
    Resample(String),

    /// Writing a WAV stream failed.
    #[error("cannot encode audio: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// DecodedAudio
// ---------------------------------------------------------------------------

/// Mono `f32` PCM plus the rate it was sampled at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds; `0.0` for a zero sample rate.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// AudioDecoder
// ---------------------------------------------------------------------------

/// Turns an uploaded recording into mono samples at a fixed rate.
///
/// The pipeline only ever sees the output of this trait; swapping in another
/// container format means implementing it, not touching the stages.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, AudioError>;
}

/// [`AudioDecoder`] for RIFF/WAV input, resampling to `target_rate`.
#[derive(Debug, Clone, Copy)]
pub struct WavDecoder {
    pub target_rate: u32,
}

impl Default for WavDecoder {
    fn default() -> Self {
        Self {
            target_rate: TARGET_SAMPLE_RATE,
        }
    }
}

impl AudioDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, AudioError> {
        decode_wav(bytes, self.target_rate)
    }
}

// ---------------------------------------------------------------------------
// decode_wav / encode_wav
// ---------------------------------------------------------------------------

/// Decode a WAV byte stream to mono `f32` at `target_rate` Hz.
///
/// Integer PCM is scaled into `[-1.0, 1.0)`; multi-channel audio is
/// averaged down to one channel before resampling.
pub fn decode_wav(bytes: &[u8], target_rate: u32) -> Result<DecodedAudio, AudioError> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(AudioError::Unsupported(format!(
            "{} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Unsupported(format!(
                    "{}-bit integer PCM",
                    spec.bits_per_sample
                )));
            }
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    let mono = downmix(&interleaved, spec.channels);
    let samples = resample(&mono, spec.sample_rate, target_rate)?;

    log::debug!(
        "audio: decoded {} frame(s) @ {} Hz × {} ch → {} sample(s) @ {} Hz",
        mono.len(),
        spec.sample_rate,
        spec.channels,
        samples.len(),
        target_rate
    );

    Ok(DecodedAudio::new(samples, target_rate))
}

/// Encode mono `f32` samples as a 16-bit PCM WAV byte stream.
///
/// Samples outside `[-1.0, 1.0]` are clipped.
pub fn encode_wav(audio: &DecodedAudio) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| AudioError::Encode(e.to_string()))?;
        for &s in &audio.samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| AudioError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
