use crate::audio::features::FeatureSet;

pub const NEGATIVE_PROMPT: &str = "text, watermark, logo, letters, photorealistic faces, hands, \
literal instruments, low resolution, blurry, oversharpen, distorted anatomy, cropped, \
jpeg artifacts, realistic draw";

pub const STYLE_PROMPT: &str = "Abstract painting, vibrant neon glow, psychedelic lighting, \
dynamic digital art, surreal atmosphere, high contrast, expressive brushstrokes, cinematic \
composition, inspired by contemporary abstract expressionism, spectrogramic background style";

fn percent(x: f32) -> i64 {
    (x as f64 * 100.0).round() as i64
}

/// Describe the analyzed audio as an image-generation prompt.
pub fn build_prompt(features: &FeatureSet) -> String {
    let tempo = match features.bpm {
        Some(bpm) => format!("{} BPM", bpm.round() as i64),
        None => "unknown tempo".to_string(),
    };
    let centroid = features.mean_centroid().round() as i64;
    let bands = features.bands_energy;

    format!(
        "An abstract artistic visualization of a live music audio. Dynamic motion, sound waves, \
         spectrograms, waveforms, colorful lights. Abstracts these: Tempo {}, timbre centroid ~{} Hz, \
         frequency balance low {}%, mid {}%, high {}%.",
        tempo,
        centroid,
        percent(bands.low),
        percent(bands.mid),
        percent(bands.high)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::{BandEnergy, Spectrogram};

    fn features(bpm: Option<f32>, centroid_hz: Vec<f32>) -> FeatureSet {
        let frames = centroid_hz.len();
        FeatureSet {
            sample_rate: 22050,
            duration: 1.0,
            channels: 1,
            fft_size: 1024,
            hop_size: 256,
            times: vec![0.0; frames],
            freqs: vec![0.0; 513],
            spectrogram: Spectrogram::new(frames, 513, vec![0.0; frames * 513]).unwrap(),
            rms_env: vec![0.0; frames],
            centroid_hz,
            rolloff_hz: vec![0.0; frames],
            flux: vec![0.0; frames],
            bpm,
            bpm_confidence: bpm.map(|_| 0.9),
            bands_energy: BandEnergy {
                low: 0.254,
                mid: 0.6,
                high: 0.146,
            },
        }
    }

    #[test]
    fn prompt_mentions_tempo_timbre_and_balance() {
        let prompt = build_prompt(&features(Some(127.6), vec![1000.0, 2001.0]));
        assert!(prompt.starts_with("An abstract artistic visualization of a live music audio."));
        assert!(prompt.contains("Tempo 128 BPM"));
        assert!(prompt.contains("timbre centroid ~1501 Hz"));
        assert!(prompt.ends_with("frequency balance low 25%, mid 60%, high 15%."));
    }

    #[test]
    fn prompt_without_tempo_or_frames() {
        let prompt = build_prompt(&features(None, Vec::new()));
        assert!(prompt.contains("Tempo unknown tempo"));
        assert!(prompt.contains("~0 Hz"));
    }
}
