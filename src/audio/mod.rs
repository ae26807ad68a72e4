//! Decoded-audio provider for the transcription stage.
//!
//! # Flow
//!
//! ```text
//! WAV bytes ──decode_wav──▶ interleaved f32 ──downmix──▶ mono
//!           ──resample──▶ 16 kHz mono f32 (DecodedAudio)
//! ```
//!
//! ```rust
//! use voice_translator::audio::{decode_wav, encode_wav, DecodedAudio, TARGET_SAMPLE_RATE};
//!
//! let clip = DecodedAudio::new(vec![0.0; 44_100], 44_100); // 1 s of silence
//! let wav = encode_wav(&clip).unwrap();
//! let audio = decode_wav(&wav, TARGET_SAMPLE_RATE).unwrap();
//! assert_eq!(audio.samples.len(), 16_000);
//! ```

pub mod decode;
pub mod resample;

pub use decode::{
    decode_wav, encode_wav, AudioDecoder, AudioError, DecodedAudio, WavDecoder,
    TARGET_SAMPLE_RATE,
};
pub use resample::{downmix, resample};
