use crate::error::{AnalysisError, Result};

/// Planar multi-channel PCM, as produced by a decoder.
///
/// Every channel holds the same number of samples. Construction through
/// [`PcmBuffer::new`] enforces that, so downstream stages can index all
/// channels with the same bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::invalid("sample rate must be positive"));
        }
        if channels.is_empty() {
            return Err(AnalysisError::invalid("PCM buffer needs at least one channel"));
        }
        let len = channels[0].len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(AnalysisError::invalid(format!(
                "channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                len
            )));
        }
        Ok(Self { sample_rate, channels })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_channels() {
        let err = PcmBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_zero_channels_and_rate() {
        assert!(PcmBuffer::new(44100, vec![]).is_err());
        assert!(PcmBuffer::new(0, vec![vec![0.0; 4]]).is_err());
    }

    #[test]
    fn reports_duration() {
        let pcm = PcmBuffer::new(8000, vec![vec![0.0; 4000], vec![0.0; 4000]]).unwrap();
        assert_eq!(pcm.channel_count(), 2);
        assert_eq!(pcm.len(), 4000);
        assert!((pcm.duration() - 0.5).abs() < 1e-12);
    }
}
