//! Color reference chart detection.
//!
//! Finds a chart of known patch layout and colors (for example the classic
//! 4×6 checker) in an arbitrary photograph and reports its outline, its
//! orientation and a robust color estimate of every patch.
//!
//! ## Quickstart
//!
//! ```
//! use colorchecker_core::Raster;
//! use colorchecker_detector::{builtins, detect, DetectorConfig};
//!
//! let pixels = vec![128u8; 64 * 48 * 3];
//! let raster = Raster::from_u8(64, 48, 3, &pixels).unwrap();
//! let topologies = vec![builtins::classic_24().unwrap()];
//! let result = detect(&raster, &topologies, &DetectorConfig::default()).unwrap();
//! assert!(!result.is_found());
//! ```
//!
//! Stages:
//! 1. normalize the raster to float RGB plus 8-bit luma;
//! 2. extract convex quadrilaterals from closed edge contours;
//! 3. cluster similar neighbouring quads and fit an integer lattice;
//! 4. align each lattice to every topology footprint, interpolating missing cells;
//! 5. sample trimmed patch colors and search all 8 grid symmetries against the
//!    reference colors;
//! 6. keep the single best scored candidate.

pub mod budget;
pub mod builtins;
pub mod contour;
mod detector;
pub mod grid;
pub mod io;
pub mod matcher;
pub mod sample;
mod topology;

pub use detector::{
    detect, select, CandidateSummary, ChartDetector, ConfigError, DetectError, Detection,
    DetectionDiagnostics, DetectionResult, DetectorConfig, NotFound, NotFoundReason, PatchColor,
    ScoredCandidate,
};
pub use builtins::BuiltinError;
pub use io::{ChartConfigError, ChartIoError, DetectConfigFile, DetectReport};
pub use topology::{ChartTopology, ChartTopologySpec, ReferenceColor, TopologyError};

pub use colorchecker_core::{Orientation, Quad, Raster, RasterError, Rotation};
