use std::fmt;

use serde::Serialize;

pub use super::descriptors::BandEnergy;
pub use super::stft::Spectrogram;
use super::tempo::Tempo;
use super::utils::mean;

/// Everything one analysis run produces. Built once, then only read.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub sample_rate: u32,
    /// Seconds of (mono) signal analyzed.
    pub duration: f32,
    /// Always 1: features describe the downmixed signal.
    pub channels: u32,
    pub fft_size: usize,
    pub hop_size: usize,
    pub times: Vec<f32>,
    pub freqs: Vec<f32>,
    pub spectrogram: Spectrogram,
    pub rms_env: Vec<f32>,
    pub centroid_hz: Vec<f32>,
    pub rolloff_hz: Vec<f32>,
    pub flux: Vec<f32>,
    pub bpm: Option<f32>,
    pub bpm_confidence: Option<f32>,
    pub bands_energy: BandEnergy,
}

impl FeatureSet {
    pub fn frame_count(&self) -> usize {
        self.spectrogram.frames()
    }

    pub fn bins(&self) -> usize {
        self.spectrogram.bins()
    }

    pub fn tempo(&self) -> Option<Tempo> {
        match (self.bpm, self.bpm_confidence) {
            (Some(bpm), Some(confidence)) => Some(Tempo { bpm, confidence }),
            _ => None,
        }
    }

    pub fn mean_rms(&self) -> f32 {
        mean(&self.rms_env)
    }

    pub fn mean_centroid(&self) -> f32 {
        mean(&self.centroid_hz)
    }

    pub fn summary(&self) -> FeatureSummary<'_> {
        FeatureSummary(self)
    }
}

/// Human-readable digest of a [`FeatureSet`].
pub struct FeatureSummary<'a>(&'a FeatureSet);

fn percent(x: f32) -> i64 {
    (x as f64 * 100.0).round() as i64
}

impl fmt::Display for FeatureSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.0;
        writeln!(f, "{:<18}{:.2} s", "Duration", fs.duration)?;

        let bpm = match fs.bpm {
            Some(bpm) => format!("{:.1}", bpm),
            None => "—".to_string(),
        };
        match fs.bpm_confidence {
            Some(conf) => writeln!(f, "{:<18}{} (conf {}%)", "BPM (est)", bpm, percent(conf))?,
            None => writeln!(f, "{:<18}{}", "BPM (est)", bpm)?,
        }

        writeln!(f, "{:<18}{:.3}", "Energy (avg RMS)", fs.mean_rms())?;
        writeln!(
            f,
            "{:<18}Low {}% · Mid {}% · High {}%",
            "Freq Balance",
            percent(fs.bands_energy.low),
            percent(fs.bands_energy.mid),
            percent(fs.bands_energy.high)
        )?;
        writeln!(f, "{:<18}{} / {} samples", "FFT / Hop", fs.fft_size, fs.hop_size)?;
        write!(f, "{:<18}{} Hz", "Sample Rate", fs.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(bpm: Option<f32>) -> FeatureSet {
        FeatureSet {
            sample_rate: 22050,
            duration: 2.5,
            channels: 1,
            fft_size: 1024,
            hop_size: 256,
            times: vec![0.1, 0.2],
            freqs: vec![0.0, 11025.0],
            spectrogram: Spectrogram::new(2, 2, vec![1.0, 0.0, 0.5, 0.5]).unwrap(),
            rms_env: vec![0.1, 0.3],
            centroid_hz: vec![1000.0, 3000.0],
            rolloff_hz: vec![0.0, 11025.0],
            flux: vec![1.0, 0.5],
            bpm,
            bpm_confidence: bpm.map(|_| 0.66),
            bands_energy: BandEnergy {
                low: 0.2,
                mid: 0.5,
                high: 0.3,
            },
        }
    }

    #[test]
    fn summary_with_tempo() {
        let text = fixture(Some(120.04)).summary().to_string();
        assert!(text.contains("2.50 s"));
        assert!(text.contains("120.0 (conf 66%)"));
        assert!(text.contains("0.200"));
        assert!(text.contains("Low 20% · Mid 50% · High 30%"));
        assert!(text.contains("1024 / 256 samples"));
        assert!(text.contains("22050 Hz"));
    }

    #[test]
    fn summary_without_tempo() {
        let fs = fixture(None);
        assert!(fs.tempo().is_none());
        assert!(fs.summary().to_string().contains("BPM (est)         —"));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(fixture(Some(100.0))).unwrap();
        assert_eq!(json["sampleRate"], 22050);
        assert_eq!(json["bandsEnergy"]["mid"], 0.5);
        assert!(json["bpmConfidence"].is_number());
        assert_eq!(json["spectrogram"]["frames"], 2);
        assert_eq!(json["centroidHz"].as_array().unwrap().len(), 2);
    }
}
