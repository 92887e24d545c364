//! Chart topology: patch grid layout plus reference colors.

use colorchecker_core::{rgb_to_lab, srgb8_to_lab, Encoding};
use serde::{Deserialize, Serialize};

/// One reference color, in whichever space the chart vendor publishes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceColor {
    /// 8-bit gamma-encoded sRGB.
    Srgb8([u8; 3]),
    /// Gamma-encoded sRGB in `[0, 1]`.
    Srgb([f32; 3]),
    /// CIELAB, D65 white point.
    Lab([f32; 3]),
}

impl ReferenceColor {
    pub fn to_lab(self) -> [f32; 3] {
        match self {
            ReferenceColor::Srgb8(rgb) => srgb8_to_lab(rgb),
            ReferenceColor::Srgb(rgb) => rgb_to_lab(rgb, Encoding::Srgb),
            ReferenceColor::Lab(lab) => lab,
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            ReferenceColor::Srgb8(_) => true,
            ReferenceColor::Srgb(rgb) => rgb.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)),
            ReferenceColor::Lab(lab) => {
                lab.iter().all(|v| v.is_finite()) && (0.0..=100.0).contains(&lab[0])
            }
        }
    }
}

fn default_spacing_ratio() -> f32 {
    1.25
}

fn default_aspect_ratio() -> f32 {
    1.0
}

/// Declarative chart description, as found in configuration files.
///
/// `colors` lists one reference per patch in row-major order, with row 0 at
/// the top of the chart held in its canonical reading orientation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartTopologySpec {
    pub id: String,
    pub rows: usize,
    pub cols: usize,
    /// Patch pitch divided by patch side (1.0 means no gap between patches).
    #[serde(default = "default_spacing_ratio")]
    pub spacing_ratio: f32,
    /// Horizontal pitch divided by vertical pitch.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f32,
    pub colors: Vec<ReferenceColor>,
}

/// Topology validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("topology id must not be empty")]
    EmptyId,
    #[error("rows and cols must be >= 2 (got {rows}x{cols})")]
    InvalidSize { rows: usize, cols: usize },
    #[error("spacing_ratio must be finite and >= 1 (got {0})")]
    InvalidSpacingRatio(f32),
    #[error("aspect_ratio must be finite and > 0 (got {0})")]
    InvalidAspectRatio(f32),
    #[error("topology needs {expected} reference colors, got {got}")]
    ColorCount { expected: usize, got: usize },
    #[error("reference color {index} is out of range")]
    InvalidColor { index: usize },
}

/// Validated chart topology with reference colors precomputed in Lab.
#[derive(Clone, Debug)]
pub struct ChartTopology {
    spec: ChartTopologySpec,
    reference_lab: Vec<[f32; 3]>,
}

impl ChartTopology {
    /// Validate a spec and convert its reference colors.
    pub fn new(spec: ChartTopologySpec) -> Result<Self, TopologyError> {
        if spec.id.trim().is_empty() {
            return Err(TopologyError::EmptyId);
        }
        if spec.rows < 2 || spec.cols < 2 {
            return Err(TopologyError::InvalidSize {
                rows: spec.rows,
                cols: spec.cols,
            });
        }
        if !spec.spacing_ratio.is_finite() || spec.spacing_ratio < 1.0 {
            return Err(TopologyError::InvalidSpacingRatio(spec.spacing_ratio));
        }
        if !spec.aspect_ratio.is_finite() || spec.aspect_ratio <= 0.0 {
            return Err(TopologyError::InvalidAspectRatio(spec.aspect_ratio));
        }
        let expected = spec.rows * spec.cols;
        if spec.colors.len() != expected {
            return Err(TopologyError::ColorCount {
                expected,
                got: spec.colors.len(),
            });
        }
        if let Some(index) = spec.colors.iter().position(|c| !c.is_valid()) {
            return Err(TopologyError::InvalidColor { index });
        }

        let reference_lab = spec.colors.iter().map(|c| c.to_lab()).collect();
        Ok(Self {
            spec,
            reference_lab,
        })
    }

    #[inline]
    pub fn spec(&self) -> &ChartTopologySpec {
        &self.spec
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.spec.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.spec.cols
    }

    #[inline]
    pub fn patch_count(&self) -> usize {
        self.spec.rows * self.spec.cols
    }

    #[inline]
    pub fn spacing_ratio(&self) -> f32 {
        self.spec.spacing_ratio
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.spec.aspect_ratio
    }

    /// Reference colors in Lab, row-major.
    #[inline]
    pub fn reference_lab(&self) -> &[[f32; 3]] {
        &self.reference_lab
    }
}
