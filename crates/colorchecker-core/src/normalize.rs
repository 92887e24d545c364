//! Conversion of caller rasters into the detector's canonical representation.
//!
//! Every supported input is mapped to a float RGB image in `[0, 1]` (keeping
//! the declared transfer function) plus an 8-bit luma derivative used for
//! edge analysis.

use crate::image::{luma, GrayImage, RgbImage};
use crate::raster::{Encoding, PixelData, Raster, RasterError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Canonical color representation of one input raster.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedImage {
    pub rgb: RgbImage,
    pub gray: GrayImage,
    pub encoding: Encoding,
}

impl NormalizedImage {
    #[inline]
    pub fn width(&self) -> usize {
        self.rgb.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rgb.height
    }
}

/// Check that the raster's channel count and bit depth are supported.
pub fn check_format(raster: &Raster<'_>) -> Result<(), RasterError> {
    let channels = raster.channels();
    let bit_depth = raster.bit_depth();
    let depth_ok = match raster.data() {
        PixelData::U8(_) => bit_depth == 8,
        PixelData::U16(_) => (9..=16).contains(&bit_depth),
    };
    if !(1..=4).contains(&channels) || !depth_ok {
        return Err(RasterError::UnsupportedFormat {
            channels,
            bit_depth,
        });
    }
    Ok(())
}

/// Normalize a raster into float RGB plus a grayscale derivative.
///
/// Layouts: 1 = gray, 2 = gray + alpha, 3 = RGB, 4 = RGBA. Alpha is ignored.
/// 16-bit containers are scaled by `2^bit_depth - 1`; values above that
/// are clamped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(raster), fields(w = raster.width(), h = raster.height()))
)]
pub fn normalize(raster: &Raster<'_>) -> Result<NormalizedImage, RasterError> {
    check_format(raster)?;

    let width = raster.width();
    let height = raster.height();
    let channels = raster.channels();
    let n = width * height;

    let mut rgb = Vec::with_capacity(n);
    match raster.data() {
        PixelData::U8(data) => {
            for px in data.chunks_exact(channels) {
                rgb.push(expand(px, channels, |v| v as f32 / 255.0));
            }
        }
        PixelData::U16(data) => {
            let max = ((1u32 << raster.bit_depth()) - 1) as f32;
            for px in data.chunks_exact(channels) {
                rgb.push(expand(px, channels, |v| (v as f32).min(max) / max));
            }
        }
    }

    let gray = rgb
        .iter()
        .map(|&p| (luma(p) * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();

    Ok(NormalizedImage {
        rgb: RgbImage {
            width,
            height,
            data: rgb,
        },
        gray: GrayImage {
            width,
            height,
            data: gray,
        },
        encoding: raster.encoding(),
    })
}

#[inline]
fn expand<T: Copy>(px: &[T], channels: usize, scale: impl Fn(T) -> f32) -> [f32; 3] {
    if channels >= 3 {
        [scale(px[0]), scale(px[1]), scale(px[2])]
    } else {
        let g = scale(px[0]);
        [g, g, g]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rgba8_drops_alpha_and_scales() {
        let data = [255u8, 0, 51, 7, 0, 255, 0, 200];
        let raster = Raster::from_u8(2, 1, 4, &data).expect("raster");
        let out = normalize(&raster).expect("normalize");
        assert_eq!(out.rgb.data.len(), 2);
        assert_abs_diff_eq!(out.rgb.data[0][0], 1.0);
        assert_abs_diff_eq!(out.rgb.data[0][2], 0.2);
        assert_abs_diff_eq!(out.rgb.data[1][1], 1.0);
        // Rec.601: 0.587 * 255 = 149.7
        assert_eq!(out.gray.data[1], 150);
    }

    #[test]
    fn gray_alpha_replicates_luma() {
        let data = [128u8, 0];
        let raster = Raster::from_u8(1, 1, 2, &data).expect("raster");
        let out = normalize(&raster).expect("normalize");
        let [r, g, b] = out.rgb.data[0];
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(out.gray.data[0], 128);
    }

    #[test]
    fn twelve_bit_samples_use_declared_depth() {
        let data = [4095u16, 2048, 0, 5000, 0, 0];
        let raster = Raster::from_u16(2, 1, 3, 12, &data).expect("raster");
        let out = normalize(&raster).expect("normalize");
        assert_abs_diff_eq!(out.rgb.data[0][0], 1.0);
        assert_abs_diff_eq!(out.rgb.data[0][1], 2048.0 / 4095.0, epsilon = 1e-6);
        // Out-of-range values clamp to full scale.
        assert_abs_diff_eq!(out.rgb.data[1][0], 1.0);
    }

    #[test]
    fn unsupported_layouts_are_rejected() {
        let five = [0u8; 5];
        let raster = Raster::from_u8(1, 1, 5, &five).expect("raster");
        assert_eq!(
            normalize(&raster),
            Err(RasterError::UnsupportedFormat {
                channels: 5,
                bit_depth: 8
            })
        );

        let wide = [0u16; 3];
        let raster = Raster::from_u16(1, 1, 3, 8, &wide).expect("raster");
        assert!(matches!(
            normalize(&raster),
            Err(RasterError::UnsupportedFormat { bit_depth: 8, .. })
        ));
    }

    #[test]
    fn encoding_is_carried_through() {
        let data = [10u8, 20, 30];
        let raster = Raster::from_u8(1, 1, 3, &data)
            .expect("raster")
            .with_encoding(Encoding::Linear);
        let out = normalize(&raster).expect("normalize");
        assert_eq!(out.encoding, Encoding::Linear);
    }
}
