//! CIELAB conversion and perceptual color differences.
//!
//! Lab values are exchanged as plain `[L, a, b]` arrays (D65 white point);
//! `palette` does the colorimetry.

use palette::color_difference::Ciede2000;
use palette::{white_point::D65, FromColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Serialize};

use crate::raster::Encoding;

/// Color difference formula used to compare samples with reference patches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMetric {
    /// Euclidean distance in Lab.
    Cie76,
    #[default]
    Ciede2000,
}

#[inline]
fn to_palette(lab: [f32; 3]) -> Lab<D65, f32> {
    Lab::new(lab[0], lab[1], lab[2])
}

/// Convert an RGB triple in `[0, 1]` with the given transfer function to Lab.
pub fn rgb_to_lab(rgb: [f32; 3], encoding: Encoding) -> [f32; 3] {
    let lab: Lab<D65, f32> = match encoding {
        Encoding::Srgb => Lab::from_color(Srgb::new(rgb[0], rgb[1], rgb[2])),
        Encoding::Linear => Lab::from_color(LinSrgb::new(rgb[0], rgb[1], rgb[2])),
    };
    [lab.l, lab.a, lab.b]
}

/// Convert an 8-bit sRGB triple to Lab.
pub fn srgb8_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    rgb_to_lab(rgb.map(|v| v as f32 / 255.0), Encoding::Srgb)
}

/// ΔE*ab (CIE 1976).
pub fn delta_e76(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dl = a[0] - b[0];
    let da = a[1] - b[1];
    let db = a[2] - b[2];
    (dl * dl + da * da + db * db).sqrt()
}

/// ΔE00 (CIEDE2000).
pub fn delta_e2000(a: [f32; 3], b: [f32; 3]) -> f32 {
    to_palette(a).difference(to_palette(b))
}

impl ColorMetric {
    #[inline]
    pub fn distance(self, a: [f32; 3], b: [f32; 3]) -> f32 {
        match self {
            ColorMetric::Cie76 => delta_e76(a, b),
            ColorMetric::Ciede2000 => delta_e2000(a, b),
        }
    }
}
