use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette (bar charts)
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging scale (correlation heatmap)
// ---------------------------------------------------------------------------

const COLD: (f32, f32, f32) = (0.230, 0.299, 0.754);
const NEUTRAL: (f32, f32, f32) = (0.865, 0.865, 0.865);
const WARM: (f32, f32, f32) = (0.706, 0.016, 0.150);

/// Blue → light grey → red colour for a value in `[-1, 1]`.
/// Out-of-range values are clamped; NaN maps to the neutral midpoint.
pub fn diverging(value: f64) -> Color32 {
    let v = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) } as f32;
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COLD, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    let lin = linear(from).mix(linear(to), t);
    to_color32(Srgb::from_linear(lin))
}

/// Readable label colour on top of [`diverging`].
pub fn diverging_text(value: f64) -> Color32 {
    if value.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

fn linear((r, g, b): (f32, f32, f32)) -> LinSrgb {
    Srgb::new(r, g, b).into_linear()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}
