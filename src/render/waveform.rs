use super::frame::RgbaFrame;
use crate::error::{AnalysisError, Result};

const BACKGROUND: [u8; 3] = [0x00, 0x00, 0x00];
const TRACE: [u8; 3] = [0x44, 0xaa, 0xff];
const MIDLINE: [u8; 3] = [0x22, 0x22, 0x22];

/// Peak envelope of a mono signal: one min/max line per pixel column.
pub fn render_waveform(signal: &[f32], width: u32, height: u32) -> Result<RgbaFrame> {
    if width == 0 || height == 0 {
        return Err(AnalysisError::invalid(format!(
            "waveform size must be non-zero, got {}x{}",
            width, height
        )));
    }

    let mut frame = RgbaFrame::filled(width, height, BACKGROUND);
    let step = signal.len().div_ceil(width as usize).max(1);
    let to_row = |v: f32| -> i64 { ((1.0 - (v as f64 + 1.0) / 2.0) * height as f64).floor() as i64 };

    for (x, column) in signal.chunks(step).enumerate().take(width as usize) {
        let (lo, hi) = column
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let top = to_row(hi).clamp(0, height as i64 - 1);
        let bottom = to_row(lo).clamp(0, height as i64 - 1);
        for y in top..=bottom {
            frame.put(x as u32, y as u32, TRACE);
        }
    }

    let mid = height / 2;
    for x in 0..width {
        frame.put(x, mid, MIDLINE);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_column_spans_the_height() {
        let signal = [1.0, -1.0, 0.0, 0.0];
        let frame = render_waveform(&signal, 2, 10).unwrap();
        // column 0 holds +1 and -1
        assert_eq!(frame.pixel(0, 0), [0x44, 0xaa, 0xff, 255]);
        assert_eq!(frame.pixel(0, 9), [0x44, 0xaa, 0xff, 255]);
        // column 1 is flat zero: trace only at the centre, under the midline
        assert_eq!(frame.pixel(1, 0), [0, 0, 0, 255]);
        assert_eq!(frame.pixel(1, 5), [0x22, 0x22, 0x22, 255]);
    }

    #[test]
    fn empty_signal_draws_only_midline() {
        let frame = render_waveform(&[], 4, 4).unwrap();
        assert_eq!(frame.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(frame.pixel(3, 2), [0x22, 0x22, 0x22, 255]);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(render_waveform(&[0.0], 0, 10).is_err());
    }
}
