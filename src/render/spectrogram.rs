use rayon::prelude::*;

use super::colormap::spectrogram_color;
use super::frame::RgbaFrame;
use crate::audio::stft::Spectrogram;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_DB_RANGE: (f32, f32) = (-80.0, 0.0);

const NORM_FLOOR: f32 = 1e-9;
const MAX_PIXEL_RATIO: f32 = 3.0;

/// Horizontal size of the rendered spectrogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthMode {
    /// Fixed width in device-independent pixels.
    Fixed(u32),
    /// Take the width of the surrounding container at render time.
    FitToContainer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub width: WidthMode,
    /// Device-independent pixels.
    pub height: u32,
    pub db_range: (f32, f32),
    pub device_pixel_ratio: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: WidthMode::FitToContainer,
            height: DEFAULT_HEIGHT,
            db_range: DEFAULT_DB_RANGE,
            device_pixel_ratio: 1.0,
        }
    }
}

impl RenderOptions {
    /// Physical output size in pixels.
    pub fn resolve_size(&self, container_width: Option<u32>) -> Result<(u32, u32)> {
        let css_width = match self.width {
            WidthMode::Fixed(w) => w,
            WidthMode::FitToContainer => container_width.ok_or_else(|| {
                AnalysisError::invalid("fit-to-container rendering needs a container width")
            })?,
        };
        if css_width == 0 || self.height == 0 {
            return Err(AnalysisError::invalid(format!(
                "render size must be non-zero, got {}x{}",
                css_width, self.height
            )));
        }

        let dpr = if self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio.clamp(1.0, MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        let scale = |css: u32| ((css as f32 * dpr).floor() as u32).max(1);
        Ok((scale(css_width), scale(self.height)))
    }
}

/// Render `grid` as time (left to right) by frequency (low at the bottom).
///
/// Each destination pixel takes the nearest source cell; nothing is
/// interpolated. Magnitudes are normalized by the grid maximum, converted to
/// decibels and mapped through the spectrogram gradient.
pub fn render_spectrogram(
    grid: &Spectrogram,
    options: &RenderOptions,
    container_width: Option<u32>,
) -> Result<RgbaFrame> {
    let (db_min, db_max) = options.db_range;
    if !(db_min < db_max) {
        return Err(AnalysisError::invalid(format!(
            "dB range must be increasing, got [{}, {}]",
            db_min, db_max
        )));
    }
    let (width, height) = options.resolve_size(container_width)?;

    if grid.frames() == 0 || grid.bins() == 0 {
        log::warn!("Rendering an empty spectrogram");
        return Ok(RgbaFrame::filled(width, height, spectrogram_color(0.0)));
    }

    let max = grid.max_magnitude().max(NORM_FLOOR) as f64;
    let db_span = (db_max - db_min) as f64;

    let columns: Vec<usize> = (0..width)
        .map(|x| ((x as u64 * grid.frames() as u64 / width as u64) as usize).min(grid.frames() - 1))
        .collect();

    let mut frame = RgbaFrame::filled(width, height, [0, 0, 0]);
    frame
        .pixels
        .par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let from_top = ((y as u64 * grid.bins() as u64 / height as u64) as usize).min(grid.bins() - 1);
            let bin = grid.bins() - 1 - from_top;
            for (px, &frame_idx) in row.chunks_exact_mut(4).zip(&columns) {
                let mag = grid.get(frame_idx, bin) as f64 / max;
                let db = 20.0 * (mag + 1e-9).log10();
                let t = ((db - db_min as f64) / db_span) as f32;
                let [r, g, b] = spectrogram_color(t);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        });

    log::debug!(
        "Rendered spectrogram {}x{} cells into {}x{} px",
        grid.frames(),
        grid.bins(),
        width,
        height
    );
    Ok(frame)
}
