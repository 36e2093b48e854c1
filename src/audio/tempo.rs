//! Single-peak autocorrelation tempo tracker.
//!
//! The onset envelope is normalized, smoothed with a ~50 ms causal moving
//! average and autocorrelated over the lags that correspond to the BPM
//! search range. The strongest lag wins. There is no octave-error
//! correction and no beat-phase alignment: a pulse train whose true period
//! lies outside the range is reported at a multiple of that period.

use super::utils::{clamp, normalize};

pub const DEFAULT_MIN_BPM: f32 = 60.0;
pub const DEFAULT_MAX_BPM: f32 = 220.0;

/// Below this many onset frames the tempo is left undetermined.
pub const MIN_ONSET_FRAMES: usize = 8;

const SMOOTHING_SECONDS: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRange {
    pub min_bpm: f32,
    pub max_bpm: f32,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            min_bpm: DEFAULT_MIN_BPM,
            max_bpm: DEFAULT_MAX_BPM,
        }
    }
}

impl TempoRange {
    pub fn is_valid(&self) -> bool {
        self.min_bpm > 0.0 && self.max_bpm >= self.min_bpm && self.max_bpm.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tempo {
    pub bpm: f32,
    /// Peak autocorrelation relative to zero-lag energy, in [0, 1].
    pub confidence: f32,
}

/// Estimate tempo from an onset envelope sampled once per hop.
///
/// Returns `None` when the envelope is too short, the parameters are unusable
/// or the only candidate lag is 0. Lags past the end of the envelope score 0,
/// so a silent or very short envelope still reports the fastest tempo in the
/// range with zero confidence.
pub fn estimate_tempo(
    onset_env: &[f32],
    hop_size: usize,
    sample_rate: u32,
    range: TempoRange,
) -> Option<Tempo> {
    if onset_env.len() < MIN_ONSET_FRAMES {
        log::debug!("Tempo: only {} onset frames, skipping", onset_env.len());
        return None;
    }
    if hop_size == 0 || sample_rate == 0 || !range.is_valid() {
        log::warn!("Tempo: unusable parameters (hop={}, sr={}, range={:?})", hop_size, sample_rate, range);
        return None;
    }

    let smoothed = smooth(&normalize(onset_env), smoothing_window(hop_size, sample_rate));

    let frames_per_minute = 60.0 * sample_rate as f64 / hop_size as f64;
    let min_lag = (frames_per_minute / range.max_bpm as f64).floor() as usize;
    let max_lag = (frames_per_minute / range.min_bpm as f64).floor() as usize;

    let mut best_lag = 0usize;
    let mut best = f64::NEG_INFINITY;
    for lag in min_lag..=max_lag {
        let score = autocorrelation(&smoothed, lag);
        if score > best {
            best = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        log::info!("Tempo: undeterminable (degenerate lag range {}..={})", min_lag, max_lag);
        return None;
    }

    let energy = autocorrelation(&smoothed, 0);
    let bpm = (frames_per_minute / best_lag as f64) as f32;
    let confidence = clamp(best / (energy + 1e-9), 0.0, 1.0) as f32;

    log::info!("Tempo: {:.1} BPM (lag {} frames, confidence {:.2})", bpm, best_lag, confidence);
    Some(Tempo { bpm, confidence })
}

fn smoothing_window(hop_size: usize, sample_rate: u32) -> usize {
    ((SMOOTHING_SECONDS * sample_rate as f64 / hop_size as f64).floor() as usize).max(3)
}

/// Causal moving average; the first `window - 1` outputs average what is available.
fn smooth(x: &[f32], window: usize) -> Vec<f64> {
    let mut acc = 0.0f64;
    x.iter()
        .enumerate()
        .map(|(i, &v)| {
            acc += v as f64;
            if i >= window {
                acc -= x[i - window] as f64;
            }
            acc / (i + 1).min(window) as f64
        })
        .collect()
}

/// Unnormalized autocorrelation `sum y[i] * y[i - lag]`.
fn autocorrelation(y: &[f64], lag: usize) -> f64 {
    if lag >= y.len() {
        return 0.0;
    }
    y[lag..].iter().zip(y).map(|(a, b)| a * b).sum()
}
