use serde::Serialize;

use super::stft::Spectrogram;

pub const ROLLOFF_FRACTION: f64 = 0.85;
pub const LOW_BAND_MAX_HZ: f32 = 250.0;
pub const MID_BAND_MAX_HZ: f32 = 2000.0;

const MAG_EPSILON: f64 = 1e-12;

/// Share of total spectral magnitude below 250 Hz, in [250, 2000) Hz and above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BandEnergy {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Per-frame spectral descriptors plus the aggregate band balance.
#[derive(Clone, Debug, Default)]
pub struct Descriptors {
    pub centroid_hz: Vec<f32>,
    pub rolloff_hz: Vec<f32>,
    /// Half-wave rectified spectral flux; the onset envelope for tempo.
    pub flux: Vec<f32>,
    pub bands_energy: BandEnergy,
}

/// Magnitude-weighted mean frequency, 0 for a (near-)silent frame.
pub fn centroid(mags: &[f32], freqs: &[f32]) -> f32 {
    let (weighted, total) = mags
        .iter()
        .zip(freqs)
        .fold((0.0f64, 0.0f64), |(w, t), (&m, &f)| (w + m as f64 * f as f64, t + m as f64));
    if total > MAG_EPSILON {
        (weighted / total) as f32
    } else {
        0.0
    }
}

/// Frequency of the first bin where the running magnitude sum reaches
/// `fraction` of the frame total.
pub fn rolloff(mags: &[f32], freqs: &[f32], fraction: f64) -> f32 {
    let total: f64 = mags.iter().map(|&m| m as f64).sum();
    let target = fraction * total;
    let mut acc = 0.0f64;
    for (k, &m) in mags.iter().enumerate() {
        acc += m as f64;
        if acc >= target {
            return freqs.get(k).copied().unwrap_or(0.0);
        }
    }
    0.0
}

/// Sum of positive magnitude increases from `prev` to `mags`.
pub fn flux(mags: &[f32], prev: &[f32]) -> f32 {
    mags.iter()
        .zip(prev)
        .map(|(&cur, &before)| (cur - before).max(0.0) as f64)
        .sum::<f64>() as f32
}

pub fn extract(spectrogram: &Spectrogram, freqs: &[f32]) -> Descriptors {
    let frames = spectrogram.frames();
    let mut centroid_hz = Vec::with_capacity(frames);
    let mut rolloff_hz = Vec::with_capacity(frames);
    let mut flux_env = Vec::with_capacity(frames);
    let mut totals = [0.0f64; 3];

    let silence = vec![0.0f32; spectrogram.bins()];
    let mut prev: &[f32] = &silence;

    for row in spectrogram.rows() {
        centroid_hz.push(centroid(row, freqs));
        rolloff_hz.push(rolloff(row, freqs, ROLLOFF_FRACTION));
        flux_env.push(flux(row, prev));

        for (&m, &f) in row.iter().zip(freqs) {
            let band = if f < LOW_BAND_MAX_HZ {
                0
            } else if f < MID_BAND_MAX_HZ {
                1
            } else {
                2
            };
            totals[band] += m as f64;
        }
        prev = row;
    }

    let grand_total: f64 = totals.iter().sum();
    let bands_energy = if grand_total > 0.0 {
        BandEnergy {
            low: (totals[0] / grand_total) as f32,
            mid: (totals[1] / grand_total) as f32,
            high: (totals[2] / grand_total) as f32,
        }
    } else {
        BandEnergy::default()
    };

    log::debug!(
        "Band balance: low={:.3} mid={:.3} high={:.3}",
        bands_energy.low,
        bands_energy.mid,
        bands_energy.high
    );

    Descriptors {
        centroid_hz,
        rolloff_hz,
        flux: flux_env,
        bands_energy,
    }
}
