use crate::error::{AnalysisError, Result};

/// Symmetric Hann window, `w[n] = 0.5 * (1 - cos(2πn / (N - 1)))`.
///
/// A single-point window degenerates to `[1.0]`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()) as f32
        })
        .collect()
}

/// Min-max normalization to `[0, 1]`. A constant input maps to all zeros.
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let den = if range > 0.0 { range } else { 1.0 };
    values.iter().map(|&v| (v - min) / den).collect()
}

/// Unweighted mean across channels at each sample index.
pub fn downmix(channels: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = channels
        .first()
        .ok_or_else(|| AnalysisError::invalid("cannot downmix zero channels"))?;
    let len = first.len();
    if channels.iter().any(|c| c.len() != len) {
        return Err(AnalysisError::invalid("cannot downmix channels of unequal length"));
    }
    if channels.len() == 1 {
        return Ok(first.clone());
    }

    let scale = 1.0 / channels.len() as f32;
    let mut mono = vec![0.0f32; len];
    for channel in channels {
        for (acc, &s) in mono.iter_mut().zip(channel) {
            *acc += s;
        }
    }
    for s in &mut mono {
        *s *= scale;
    }
    Ok(mono)
}

pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_endpoints_and_peak() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-7);
        assert!(w[1023].abs() < 1e-7);
        // symmetric window: the two middle samples are equal and near 1
        assert!((w[511] - w[512]).abs() < 1e-6);
        assert!(w[511] > 0.999);
    }

    #[test]
    fn normalize_maps_to_unit_range() {
        let out = normalize(&[2.0, 4.0, 3.0]);
        assert_eq!(out, vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize(&[5.0, 5.0]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn downmix_single_channel_is_identity() {
        let ch = vec![0.1, -0.4, 0.9];
        assert_eq!(downmix(&[ch.clone()]).unwrap(), ch);
    }

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix(&[vec![1.0, 0.0], vec![0.0, -1.0]]).unwrap();
        assert_eq!(mono, vec![0.5, -0.5]);
    }

    #[test]
    fn downmix_rejects_bad_layouts() {
        assert!(matches!(downmix(&[]), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(
            downmix(&[vec![0.0; 3], vec![0.0; 2]]),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
