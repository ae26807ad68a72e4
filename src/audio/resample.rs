//! Channel downmix and sample-rate conversion.
//!
//! Whisper wants **16 kHz mono `f32`**.  Uploaded recordings arrive at
//! whatever rate and channel count the browser or phone picked, so the
//! decoder runs them through:
//!
//! 1. [`downmix`]: average interleaved channels into one.
//! 2. [`resample`]: band-limited sinc interpolation (`rubato::SincFixedIn`,
//!    `BlackmanHarris2` window) to the target rate.  Content above the
//!    output Nyquist frequency is filtered out instead of folding back.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::decode::AudioError;

/// Frames fed to the resampler per `process` call.
const CHUNK_FRAMES: usize = 1024;

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Average interleaved multi-channel frames into mono.
///
/// Output length is `samples.len() / channels`; a trailing partial frame is
/// dropped.  `channels == 0` yields an empty vector.
///
/// ```rust
/// use voice_translator::audio::downmix;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Convert mono `samples` from `from_rate` Hz to `to_rate` Hz.
///
/// Equal rates return a copy.  A zero rate on either side is
/// [`AudioError::Unsupported`].  The output length is
/// `ceil(samples.len() * to_rate / from_rate)`, aligned with the input: the
/// filter delay is removed and the tail is flushed.
///
/// ```rust
/// use voice_translator::audio::resample;
///
/// let hi = vec![0.25_f32; 480]; // 10 ms @ 48 kHz
/// assert_eq!(resample(&hi, 48_000, 16_000).unwrap().len(), 160);
/// ```
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Unsupported(format!(
            "resampling {from_rate} Hz to {to_rate} Hz"
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        1.0,
        params,
        CHUNK_FRAMES,
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = (samples.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + CHUNK_FRAMES);
    let failed = |e: rubato::ResampleError| AudioError::Resample(e.to_string());

    let mut chunks = samples.chunks_exact(CHUNK_FRAMES);
    for chunk in &mut chunks {
        let waves = resampler.process(std::slice::from_ref(&chunk), None).map_err(failed)?;
        out.extend_from_slice(&waves[0]);
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let waves = resampler
            .process_partial(Some(std::slice::from_ref(&rest)), None)
            .map_err(failed)?;
        out.extend_from_slice(&waves[0]);
    }
    // Flush the filter until the delayed tail is out.
    while out.len() < expected + delay {
        let waves = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(failed)?;
        out.extend_from_slice(&waves[0]);
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
