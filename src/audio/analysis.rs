use serde::Deserialize;

use super::descriptors;
use super::features::FeatureSet;
use super::pcm::PcmBuffer;
use super::resample::resample;
use super::stft::{StftEngine, DEFAULT_FFT_SIZE};
use super::tempo::{estimate_tempo, TempoRange, DEFAULT_MAX_BPM, DEFAULT_MIN_BPM};
use super::utils::downmix;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub target_sample_rate: u32,
    pub fft_size: usize,
    /// Defaults to a quarter of the FFT size.
    pub hop_size: Option<usize>,
    pub min_bpm: f32,
    pub max_bpm: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_SAMPLE_RATE,
            fft_size: DEFAULT_FFT_SIZE,
            hop_size: None,
            min_bpm: DEFAULT_MIN_BPM,
            max_bpm: DEFAULT_MAX_BPM,
        }
    }
}

impl AnalysisConfig {
    pub fn hop_size(&self) -> usize {
        self.hop_size.unwrap_or(self.fft_size / 4)
    }

    pub fn tempo_range(&self) -> TempoRange {
        TempoRange {
            min_bpm: self.min_bpm,
            max_bpm: self.max_bpm,
        }
    }

    /// Reject configurations that cannot run, before any audio is touched.
    pub fn validate(&self) -> Result<()> {
        if self.target_sample_rate == 0 {
            return Err(AnalysisError::invalid("target sample rate must be positive"));
        }
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(AnalysisError::invalid(format!(
                "FFT size must be a power of two >= 2, got {}",
                self.fft_size
            )));
        }
        if self.hop_size() == 0 {
            return Err(AnalysisError::invalid("hop size must be positive"));
        }
        if !self.tempo_range().is_valid() {
            return Err(AnalysisError::invalid(format!(
                "BPM range must satisfy 0 < min <= max, got {}..{}",
                self.min_bpm, self.max_bpm
            )));
        }
        Ok(())
    }
}

/// Full pipeline: resample to the analysis rate, downmix, then analyze.
pub fn analyze_pcm(pcm: PcmBuffer, config: &AnalysisConfig) -> Result<FeatureSet> {
    config.validate()?;
    let resampled = resample(pcm, config.target_sample_rate)?;
    let sample_rate = resampled.sample_rate();
    let mono = downmix(resampled.channels())?;
    drop(resampled);
    analyze_signal(&mono, sample_rate, config)
}

/// Analyze an already-mono signal at its own sample rate.
pub fn analyze_signal(signal: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Result<FeatureSet> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(AnalysisError::invalid("sample rate must be positive"));
    }

    let hop_size = config.hop_size();
    let engine = StftEngine::new(config.fft_size, hop_size)?;

    log::info!(
        "Analyzing {} samples @ {}Hz (fft={}, hop={})",
        signal.len(),
        sample_rate,
        config.fft_size,
        hop_size
    );

    let stft = engine.process(signal, sample_rate)?;
    let desc = descriptors::extract(&stft.spectrogram, &stft.freqs);
    let tempo = estimate_tempo(&desc.flux, hop_size, sample_rate, config.tempo_range());

    log::info!(
        "Features: {} frames, tempo={}",
        stft.frame_count(),
        tempo.map_or_else(|| "undetermined".to_string(), |t| format!("{:.1} BPM", t.bpm))
    );

    Ok(FeatureSet {
        sample_rate,
        duration: (signal.len() as f64 / sample_rate as f64) as f32,
        channels: 1,
        fft_size: config.fft_size,
        hop_size,
        times: stft.times,
        freqs: stft.freqs,
        spectrogram: stft.spectrogram,
        rms_env: stft.rms_env,
        centroid_hz: desc.centroid_hz,
        rolloff_hz: desc.rolloff_hz,
        flux: desc.flux,
        bpm: tempo.map(|t| t.bpm),
        bpm_confidence: tempo.map(|t| t.confidence),
        bands_energy: desc.bands_energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    fn assert_all_finite(fs: &FeatureSet) {
        let series = [&fs.times, &fs.rms_env, &fs.centroid_hz, &fs.rolloff_hz, &fs.flux];
        for s in series {
            assert!(s.iter().all(|v| v.is_finite()));
        }
        assert!(fs.spectrogram.data().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn default_config_matches_reference_sizes() {
        let config = AnalysisConfig::default();
        assert_eq!(config.hop_size(), 256);
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.target_sample_rate, 22050);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_config() {
        let bad = [
            AnalysisConfig { target_sample_rate: 0, ..Default::default() },
            AnalysisConfig { fft_size: 1000, ..Default::default() },
            AnalysisConfig { hop_size: Some(0), ..Default::default() },
            AnalysisConfig { min_bpm: 0.0, ..Default::default() },
            AnalysisConfig { min_bpm: 200.0, max_bpm: 100.0, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(AnalysisError::InvalidParameter(_))));
        }
    }

    #[test]
    fn per_frame_series_share_frame_count() {
        let signal = tone(440.0, 22050, 22050);
        let fs = analyze_signal(&signal, 22050, &AnalysisConfig::default()).unwrap();
        let frames = (signal.len() - 1024) / 256 + 1;

        assert_eq!(fs.frame_count(), frames);
        for len in [fs.times.len(), fs.rms_env.len(), fs.centroid_hz.len(), fs.rolloff_hz.len(), fs.flux.len()] {
            assert_eq!(len, frames);
        }
        assert_eq!(fs.spectrogram.data().len(), frames * 513);
        assert_eq!(fs.channels, 1);
        assert!((fs.duration - 1.0).abs() < 1e-6);
        assert_all_finite(&fs);

        let b = fs.bands_energy;
        assert!((b.low + b.mid + b.high - 1.0).abs() < 1e-6);
        // 440 Hz lands in the mid band
        assert!(b.mid > b.low && b.mid > b.high);
    }

    #[test]
    fn silence_has_defined_fallbacks() {
        let fs = analyze_signal(&vec![0.0; 8192], 22050, &AnalysisConfig::default()).unwrap();
        assert_all_finite(&fs);
        assert_eq!(fs.bands_energy, descriptors::BandEnergy::default());
        assert!(fs.centroid_hz.iter().all(|&c| c == 0.0));
        assert!(fs.rolloff_hz.iter().all(|&r| r == 0.0));
        // flat envelope: every lag ties at 0, the fastest lag in range wins
        let bpm = fs.bpm.unwrap();
        assert!((bpm - 224.7).abs() < 0.05, "bpm = {}", bpm);
        assert_eq!(fs.bpm_confidence, Some(0.0));
    }

    #[test]
    fn analyze_pcm_resamples_and_downmixes() {
        let left = tone(440.0, 44100, 44100);
        let right = vec![0.0; 44100];
        let pcm = PcmBuffer::new(44100, vec![left, right]).unwrap();
        let fs = analyze_pcm(pcm, &AnalysisConfig::default()).unwrap();

        assert_eq!(fs.sample_rate, 22050);
        assert_eq!(fs.channels, 1);
        assert!((fs.duration - 1.0).abs() < 1e-3);
        let centroid = fs.mean_centroid();
        assert!(centroid > 300.0 && centroid < 700.0, "centroid = {}", centroid);
    }

    #[test]
    fn invalid_config_fails_before_processing() {
        let pcm = PcmBuffer::new(44100, vec![vec![0.0; 4096]]).unwrap();
        let config = AnalysisConfig { target_sample_rate: 0, ..Default::default() };
        assert!(matches!(analyze_pcm(pcm, &config), Err(AnalysisError::InvalidParameter(_))));
    }
}
