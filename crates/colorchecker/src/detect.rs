use crate::{core, detector};
use ::image::DynamicImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("unsupported image color type {0:?}")]
    UnsupportedImage(::image::ColorType),

    #[error(transparent)]
    Raster(#[from] core::RasterError),

    #[error(transparent)]
    Detect(#[from] detector::DetectError),
}

/// Borrow the pixels of an integer `DynamicImage` as a raster.
///
/// 8- and 16-bit gray, gray+alpha, RGB and RGBA buffers are supported; float
/// images must be converted first (see [`detect_image`]).
pub fn raster_from_image(img: &DynamicImage) -> Result<core::Raster<'_>, DetectError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raster = match img {
        DynamicImage::ImageLuma8(b) => core::Raster::from_u8(w, h, 1, b.as_raw())?,
        DynamicImage::ImageLumaA8(b) => core::Raster::from_u8(w, h, 2, b.as_raw())?,
        DynamicImage::ImageRgb8(b) => core::Raster::from_u8(w, h, 3, b.as_raw())?,
        DynamicImage::ImageRgba8(b) => core::Raster::from_u8(w, h, 4, b.as_raw())?,
        DynamicImage::ImageLuma16(b) => core::Raster::from_u16(w, h, 1, 16, b.as_raw())?,
        DynamicImage::ImageLumaA16(b) => core::Raster::from_u16(w, h, 2, 16, b.as_raw())?,
        DynamicImage::ImageRgb16(b) => core::Raster::from_u16(w, h, 3, 16, b.as_raw())?,
        DynamicImage::ImageRgba16(b) => core::Raster::from_u16(w, h, 4, 16, b.as_raw())?,
        other => return Err(DetectError::UnsupportedImage(other.color())),
    };
    Ok(raster)
}

/// Run the detector on a decoded image.
///
/// Float images are converted to 16-bit RGB first; everything else is
/// borrowed as is.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    img: &DynamicImage,
    topologies: &[detector::ChartTopology],
    config: &detector::DetectorConfig,
) -> Result<detector::DetectionResult, DetectError> {
    let converted;
    let img = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            converted = DynamicImage::ImageRgb16(img.to_rgb16());
            &converted
        }
        other => other,
    };
    let raster = raster_from_image(img)?;
    Ok(detector::detect(&raster, topologies, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Rgb, Rgb32FImage, RgbImage};

    fn classic() -> Vec<detector::ChartTopology> {
        vec![detector::builtins::classic_24().expect("classic_24")]
    }

    // Classic chart, 30 px patches on a 40 px pitch over a black body.
    fn chart_image() -> RgbImage {
        let topologies = classic();
        let colors: Vec<[u8; 3]> = topologies[0]
            .spec()
            .colors
            .iter()
            .map(|c| match c {
                detector::ReferenceColor::Srgb8(rgb) => *rgb,
                other => panic!("unexpected reference {other:?}"),
            })
            .collect();
        ImageBuffer::from_fn(320, 240, |x, y| {
            let (x, y) = (x as i32, y as i32);
            if !(30..290).contains(&x) || !(30..210).contains(&y) {
                return Rgb([140, 140, 140]);
            }
            let (u, v) = (x - 45, y - 45);
            if u >= 0 && v >= 0 && u % 40 < 30 && v % 40 < 30 && u / 40 < 6 && v / 40 < 4 {
                Rgb(colors[(v / 40 * 6 + u / 40) as usize])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn borrows_integer_images() {
        let img = DynamicImage::ImageRgb8(chart_image());
        let raster = raster_from_image(&img).expect("raster");
        assert_eq!((raster.width(), raster.height(), raster.channels()), (320, 240, 3));

        let gray = DynamicImage::ImageLuma16(img.to_luma16());
        let raster = raster_from_image(&gray).expect("raster");
        assert_eq!((raster.channels(), raster.bit_depth()), (1, 16));
    }

    #[test]
    fn float_images_need_conversion() {
        let img = DynamicImage::ImageRgb32F(Rgb32FImage::new(4, 4));
        assert!(matches!(
            raster_from_image(&img),
            Err(DetectError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn detects_chart_in_rgb_and_rgba_images() {
        let _ = env_logger::builder().is_test(true).try_init();
        let rgb = DynamicImage::ImageRgb8(chart_image());
        let config = detector::DetectorConfig::default();
        for img in [rgb.clone(), DynamicImage::ImageRgba8(rgb.to_rgba8())] {
            let result = detect_image(&img, &classic(), &config).expect("detect");
            let chart = result.detection().expect("found");
            assert_eq!(chart.topology_id, "classic_24");
            assert_eq!(chart.orientation, core::Orientation::IDENTITY);
        }
    }
}
