//! Core raster, geometry and colorimetry types for color chart detection.
//!
//! This crate holds no detector policy: it normalizes caller rasters,
//! represents quadrilaterals and lattice homographies, enumerates the
//! symmetries of a patch grid and converts colors to CIELAB.

mod color;
mod homography;
mod image;
mod logger;
mod normalize;
mod orientation;
mod quad;
mod raster;

pub use color::{delta_e2000, delta_e76, rgb_to_lab, srgb8_to_lab, ColorMetric};
pub use homography::{estimate_homography, fit_affine, homography_from_4pt, Homography};
pub use image::{luma, GrayImage, GrayImageView, RgbImage};
pub use normalize::{check_format, normalize, NormalizedImage};
pub use orientation::{Orientation, Rotation, ALL_ORIENTATIONS};
pub use quad::Quad;
pub use raster::{Encoding, PixelData, Raster, RasterError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
