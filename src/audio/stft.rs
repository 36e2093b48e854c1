use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Serialize;

use super::utils::hann_window;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_FFT_SIZE: usize = 1024;

/// Row-major `frames x bins` magnitude grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Spectrogram {
    frames: usize,
    bins: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    pub fn new(frames: usize, bins: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != frames * bins {
            return Err(AnalysisError::invalid(format!(
                "spectrogram data has {} cells, expected {} x {}",
                data.len(),
                frames,
                bins
            )));
        }
        Ok(Self { frames, bins, data })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Row-major cells; always `frames * bins` long.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, frame: usize) -> &[f32] {
        &self.data[frame * self.bins..(frame + 1) * self.bins]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; an empty grid has no rows anyway
        self.data.chunks_exact(self.bins.max(1))
    }

    #[inline]
    pub fn get(&self, frame: usize, bin: usize) -> f32 {
        self.data[frame * self.bins + bin]
    }

    /// Largest magnitude in the grid, or 0 when empty.
    pub fn max_magnitude(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }
}

/// Raw STFT products, before descriptor extraction.
#[derive(Clone, Debug)]
pub struct StftOutput {
    pub spectrogram: Spectrogram,
    /// Frame-centre timestamps in seconds.
    pub times: Vec<f32>,
    pub freqs: Vec<f32>,
    pub rms_env: Vec<f32>,
}

impl StftOutput {
    pub fn frame_count(&self) -> usize {
        self.spectrogram.frames()
    }
}

/// Windowed real-input FFT slid across a mono signal.
pub struct StftEngine {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl StftEngine {
    /// Engine with a Hann window of length `fft_size`.
    pub fn new(fft_size: usize, hop_size: usize) -> Result<Self> {
        Self::with_window(fft_size, hop_size, hann_window(fft_size))
    }

    pub fn with_window(fft_size: usize, hop_size: usize, window: Vec<f32>) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(AnalysisError::invalid(format!(
                "FFT size must be a power of two >= 2, got {}",
                fft_size
            )));
        }
        if hop_size == 0 {
            return Err(AnalysisError::invalid("hop size must be positive"));
        }
        if window.len() != fft_size {
            return Err(AnalysisError::invalid(format!(
                "window length {} does not match FFT size {}",
                window.len(),
                fft_size
            )));
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        Ok(Self {
            fft_size,
            hop_size,
            window,
            fft,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Full frames that fit in `signal_len` samples; the partial tail is dropped.
    pub fn frame_count(&self, signal_len: usize) -> usize {
        if signal_len < self.fft_size {
            0
        } else {
            (signal_len - self.fft_size) / self.hop_size + 1
        }
    }

    pub fn frequencies(&self, sample_rate: u32) -> Vec<f32> {
        (0..self.bins())
            .map(|k| (k as f64 * sample_rate as f64 / self.fft_size as f64) as f32)
            .collect()
    }

    pub fn process(&self, signal: &[f32], sample_rate: u32) -> Result<StftOutput> {
        if sample_rate == 0 {
            return Err(AnalysisError::invalid("sample rate must be positive"));
        }

        let n = self.fft_size;
        let bins = self.bins();
        let frames = self.frame_count(signal.len());
        if frames == 0 {
            log::warn!(
                "Signal of {} samples is shorter than one {}-sample window",
                signal.len(),
                n
            );
        }

        let mut spectrogram = vec![0.0f32; frames * bins];
        let mut rms_env = vec![0.0f32; frames];
        let times: Vec<f32> = (0..frames)
            .map(|i| (((i * self.hop_size) as f64 + n as f64 * 0.5) / sample_rate as f64) as f32)
            .collect();

        let zero = Complex::new(0.0f32, 0.0);
        let scratch_len = self.fft.get_inplace_scratch_len();

        spectrogram
            .par_chunks_mut(bins)
            .zip(rms_env.par_iter_mut())
            .enumerate()
            .for_each_init(
                || (vec![zero; n], vec![zero; scratch_len]),
                |(buf, scratch), (i, (row, rms))| {
                    let start = i * self.hop_size;
                    let mut sum_sq = 0.0f64;
                    for (idx, slot) in buf.iter_mut().enumerate() {
                        let v = signal.get(start + idx).copied().unwrap_or(0.0) * self.window[idx];
                        sum_sq += v as f64 * v as f64;
                        *slot = Complex::new(v, 0.0);
                    }
                    *rms = (sum_sq / n as f64).sqrt() as f32;

                    self.fft.process_with_scratch(buf, scratch);
                    for (mag, c) in row.iter_mut().zip(buf.iter()) {
                        *mag = c.norm();
                    }
                },
            );

        log::debug!("STFT: {} frames x {} bins (fft={}, hop={})", frames, bins, n, self.hop_size);

        Ok(StftOutput {
            spectrogram: Spectrogram {
                frames,
                bins,
                data: spectrogram,
            },
            times,
            freqs: self.frequencies(sample_rate),
            rms_env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_drops_partial_tail() {
        let engine = StftEngine::new(1024, 256).unwrap();
        assert_eq!(engine.frame_count(5000), 16);
        assert_eq!(engine.frame_count(1024), 1);
        assert_eq!(engine.frame_count(1023), 0);

        let out = engine.process(&vec![0.1; 5000], 22050).unwrap();
        assert_eq!(out.frame_count(), 16);
        assert_eq!(out.times.len(), 16);
        assert_eq!(out.rms_env.len(), 16);
        assert_eq!(out.spectrogram.data().len(), 16 * 513);
        assert_eq!(out.freqs.len(), 513);
    }

    #[test]
    fn grid_shape_must_match_its_cells() {
        assert!(Spectrogram::new(2, 3, vec![0.0; 5]).is_err());
        assert!(Spectrogram::new(3, 2, vec![0.0; 7]).is_err());

        let grid = Spectrogram::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!((grid.frames(), grid.bins()), (2, 3));
        assert_eq!(grid.data().len(), grid.frames() * grid.bins());
        assert_eq!(grid.row(1), &[3.0f32, 4.0, 5.0][..]);
        assert_eq!(grid.get(1, 2), 5.0);
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn short_signal_yields_no_frames() {
        let engine = StftEngine::new(1024, 256).unwrap();
        let out = engine.process(&[0.5; 100], 22050).unwrap();
        assert_eq!(out.frame_count(), 0);
        assert!(out.spectrogram.is_empty());
        assert!(out.times.is_empty());
        assert_eq!(out.freqs.len(), 513);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(StftEngine::new(1000, 256), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(StftEngine::new(1024, 0), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(
            StftEngine::with_window(1024, 256, vec![1.0; 512]),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn frequency_axis_and_times() {
        let engine = StftEngine::new(1024, 256).unwrap();
        let out = engine.process(&vec![0.0; 2048], 22050).unwrap();
        assert_eq!(out.freqs[0], 0.0);
        assert!((out.freqs[1] - 22050.0 / 1024.0).abs() < 1e-4);
        assert!((out.freqs[512] - 11025.0).abs() < 1e-3);
        assert!((out.times[0] - 512.0 / 22050.0).abs() < 1e-7);
        assert!((out.times[1] - 768.0 / 22050.0).abs() < 1e-7);
    }

    #[test]
    fn dc_frame_rms_and_magnitude() {
        let engine = StftEngine::new(1024, 256).unwrap();
        let out = engine.process(&vec![1.0; 1024], 22050).unwrap();
        // mean of hann^2 is ~3/8
        assert!((out.rms_env[0] - 0.375f32.sqrt()).abs() < 1e-3);
        // DC bin collects the window sum (N - 1) / 2
        assert!((out.spectrogram.get(0, 0) - 511.5).abs() < 0.05);
        assert!(out.spectrogram.data().iter().all(|&m| m >= 0.0));
    }
}
