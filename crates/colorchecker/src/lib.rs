//! High-level facade crate for the `colorchecker-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the core and detector crates
//! - (feature-gated) helpers that run the detector on an `image::DynamicImage`.
//!
//! ## Quickstart
//!
//! ```no_run
//! use colorchecker::detect;
//! use colorchecker::detector::{builtins, DetectionResult, DetectorConfig};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("scene.jpg")?.decode()?;
//! let topologies = vec![builtins::classic_24()?];
//!
//! match detect::detect_image(&img, &topologies, &DetectorConfig::default())? {
//!     DetectionResult::Found(chart) => println!("chart at {:?}", chart.bounding_quad),
//!     DetectionResult::NotFound(nf) => println!("not found: {}", nf.reason),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `colorchecker::core`: rasters, quads, homographies, orientations, CIELAB helpers.
//! - `colorchecker::detector`: chart topologies, configuration, the detection pipeline.
//! - `colorchecker::detect` (feature `image`): helpers from `image::DynamicImage`.

pub use colorchecker_core as core;
pub use colorchecker_detector as detector;

pub use colorchecker_core::{Encoding, Orientation, Quad, Raster, Rotation};
pub use colorchecker_detector::{
    ChartDetector, ChartTopology, ChartTopologySpec, Detection, DetectionResult, DetectorConfig,
    NotFoundReason, PatchColor,
};

#[cfg(feature = "image")]
pub mod detect;
