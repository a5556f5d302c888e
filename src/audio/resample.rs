//! Channel mixing and sample-rate conversion.
//!
//! Every analyser downstream of the preprocessor assumes a single canonical
//! rate (16 kHz by default).  This module provides the two conversion steps:
//!
//! 1. [`stereo_to_mono`]: downmix any number of interleaved channels to mono.
//! 2. [`resample`]: convert mono audio from any source rate to the target
//!    rate with `rubato`'s polynomial `FastFixedIn` resampler.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use thiserror::Error;

/// Rubato failed to build or run the resampler.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("resampling {from} Hz → {to} Hz failed: {message}")]
pub struct ResampleError {
    pub from: u32,
    pub to: u32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`; `channels == 0` yields an
/// empty vector and `channels == 1` copies the input unchanged.
///
/// ```rust
/// use speech_analytics::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
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

/// Number of samples `len` source samples become at the target rate.
pub fn resampled_len(len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == 0 {
        return 0;
    }
    (len as f64 * target_rate as f64 / source_rate as f64).round() as usize
}

/// Resample mono `samples` from `source_rate` to `target_rate`.
///
/// The whole buffer is processed as a single rubato chunk.  The output is
/// trimmed or zero-padded to exactly [`resampled_len`] samples so that the
/// recording's duration is preserved.
///
/// Equal rates and empty input are returned unchanged.
pub fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, ResampleError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let err = |message: String| ResampleError {
        from: source_rate,
        to: target_rate,
        message,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        samples.len(),
        1,
    )
    .map_err(|e| err(e.to_string()))?;

    let planar_input = vec![samples.to_vec()];
    let mut planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| err(e.to_string()))?;

    let mut output = planar_output.pop().unwrap_or_default();
    output.resize(resampled_len(samples.len(), source_rate, target_rate), 0.0);
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
