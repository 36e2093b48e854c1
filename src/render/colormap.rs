/// One anchor of a piecewise-linear colour gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub t: f32,
    pub rgb: [u8; 3],
}

/// Black, deep violet, orange, pale yellow.
pub const SPECTROGRAM_STOPS: [ColorStop; 4] = [
    ColorStop { t: 0.0, rgb: [0, 0, 0] },
    ColorStop { t: 0.3, rgb: [40, 0, 80] },
    ColorStop { t: 0.6, rgb: [200, 60, 0] },
    ColorStop { t: 1.0, rgb: [255, 220, 70] },
];

/// Sample `stops` at `t`, interpolating linearly between the bracketing pair.
///
/// `t` is clamped to [0, 1]; non-finite values sample the bottom stop.
pub fn sample(stops: &[ColorStop], t: f32) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    let mut i = 0;
    while i + 1 < stops.len() && t > stops[i + 1].t {
        i += 1;
    }
    let a = stops[i];
    let b = stops[(i + 1).min(stops.len() - 1)];
    let u = (t - a.t) / (b.t - a.t).max(1e-6);

    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * u).round() as u8;
    [lerp(a.rgb[0], b.rgb[0]), lerp(a.rgb[1], b.rgb[1]), lerp(a.rgb[2], b.rgb[2])]
}

pub fn spectrogram_color(t: f32) -> [u8; 3] {
    sample(&SPECTROGRAM_STOPS, t)
}
