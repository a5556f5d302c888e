//! Fixed-size overlapping analysis frames.
//!
//! [`Framer`] slices canonical-rate audio into windows of `frame_len` samples
//! advancing by `hop_len` (25 ms / 10 ms at 16 kHz by default).  The last
//! window is zero-padded so the whole recording is covered; input shorter than
//! one window yields exactly one padded frame.

use tokio_util::sync::CancellationToken;

/// Floor applied to every dBFS figure (digital silence).
pub const MIN_DBFS: f64 = -120.0;

/// How many frames to build between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1_024;

// ---------------------------------------------------------------------------
// Level helpers
// ---------------------------------------------------------------------------

/// Root-mean-square amplitude of `samples` (`0.0` for an empty slice).
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean_sq = samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>()
        / samples.len() as f64;
    mean_sq.sqrt() as f32
}

/// Convert an RMS amplitude to dBFS, floored at [`MIN_DBFS`].
pub fn amplitude_to_dbfs(rms: f64) -> f64 {
    if rms <= 0.0 {
        return MIN_DBFS;
    }
    (20.0 * rms.log10()).max(MIN_DBFS)
}

/// Convert a mean power (RMS²) to dB, floored at [`MIN_DBFS`].
pub fn power_to_db(power: f64) -> f64 {
    if power <= 0.0 {
        return MIN_DBFS;
    }
    (10.0 * power.log10()).max(MIN_DBFS)
}

// ---------------------------------------------------------------------------
// WaveformFrame
// ---------------------------------------------------------------------------

/// One analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFrame {
    index: usize,
    start_time: f64,
    samples: Vec<f32>,
    rms: f32,
}

impl WaveformFrame {
    pub fn new(index: usize, start_time: f64, samples: Vec<f32>) -> Self {
        let rms = rms(&samples);
        Self {
            index,
            start_time,
            samples,
            rms,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Time of the window's first sample, in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn rms(&self) -> f32 {
        self.rms
    }

    pub fn dbfs(&self) -> f64 {
        amplitude_to_dbfs(self.rms as f64)
    }
}

// ---------------------------------------------------------------------------
// Framer
// ---------------------------------------------------------------------------

/// Splits audio into overlapping [`WaveformFrame`]s.
#[derive(Debug, Clone, Copy)]
pub struct Framer {
    frame_len: usize,
    hop_len: usize,
    sample_rate: u32,
}

impl Framer {
    /// `frame_len` and `hop_len` must be non-zero; config validation
    /// guarantees this for the values the engine passes in.
    pub fn new(frame_len: usize, hop_len: usize, sample_rate: u32) -> Self {
        Self {
            frame_len: frame_len.max(1),
            hop_len: hop_len.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn hop_len(&self) -> usize {
        self.hop_len
    }

    pub fn frame_secs(&self) -> f64 {
        self.frame_len as f64 / self.sample_rate as f64
    }

    pub fn hop_secs(&self) -> f64 {
        self.hop_len as f64 / self.sample_rate as f64
    }

    /// Number of frames produced for `len` samples (at least one).
    pub fn frame_count(&self, len: usize) -> usize {
        if len <= self.frame_len {
            1
        } else {
            1 + (len - self.frame_len).div_ceil(self.hop_len)
        }
    }

    /// Frame `samples`, checking `cancel` periodically.
    ///
    /// Returns `None` if cancellation was requested part-way through.
    pub fn frames(&self, samples: &[f32], cancel: &CancellationToken) -> Option<Vec<WaveformFrame>> {
        let count = self.frame_count(samples.len());
        let mut frames = Vec::with_capacity(count);

        for index in 0..count {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
            let start = index * self.hop_len;
            let end = (start + self.frame_len).min(samples.len());
            let mut window = Vec::with_capacity(self.frame_len);
            if start < end {
                window.extend_from_slice(&samples[start..end]);
            }
            window.resize(self.frame_len, 0.0);

            frames.push(WaveformFrame::new(
                index,
                start as f64 / self.sample_rate as f64,
                window,
            ));
        }
        Some(frames)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
