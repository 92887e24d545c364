use colorchecker_core::{Orientation, Quad};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimated color of one reference patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchColor {
    /// Index into the topology's row-major reference colors.
    pub reference_index: usize,
    /// Patch outline in image pixels.
    pub quad: Quad,
    /// Trimmed mean RGB in `[0, 1]`, same encoding as the input raster.
    pub rgb: [f32; 3],
    pub variance: [f32; 3],
    /// CIELAB (D65) of `rgb`.
    pub lab: [f32; 3],
    /// Color distance to the reference, capped at the matcher maximum.
    pub distance: f32,
    /// Outline came from the image rather than from the fitted lattice.
    pub observed: bool,
    /// Color was interpolated from neighbouring patches.
    pub synthesized: bool,
}

/// A located chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub topology_id: String,
    /// Outer outline of the patch grid, clockwise from the top-left-most corner.
    pub bounding_quad: Quad,
    /// Symmetry mapping the chart's reading order onto the image lattice.
    pub orientation: Orientation,
    /// One entry per reference patch, ordered by reference index.
    pub patches: Vec<PatchColor>,
    /// Combined geometric and color score in `[0, 1]`.
    pub match_score: f32,
    pub geometric_confidence: f32,
    pub mean_distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    NoQuadrilaterals,
    BelowThreshold,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundReason::NoQuadrilaterals => "no quadrilateral candidates",
            NotFoundReason::BelowThreshold => "no chart above confidence threshold",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotFound {
    pub reason: NotFoundReason,
    /// Best score seen, when any candidate was scored.
    pub best_score: Option<f32>,
}

/// Outcome of one detection call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionResult {
    Found(Detection),
    NotFound(NotFound),
}

impl DetectionResult {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            DetectionResult::Found(d) => Some(d),
            DetectionResult::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DetectionResult::Found(_))
    }
}

/// Counts gathered along the way, for logging and reports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionDiagnostics {
    pub quad_count: usize,
    pub grid_count: usize,
    /// Scored candidates, best first.
    pub candidates: Vec<CandidateSummary>,
    /// Work units consumed.
    pub iterations: usize,
    pub budget_exhausted: bool,
}

/// One scored (grid, orientation) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub topology_id: String,
    pub cluster_index: usize,
    pub orientation: Orientation,
    pub score: f32,
    pub geometric_confidence: f32,
    pub mean_distance: f32,
    pub matched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_display_human_text() {
        assert_eq!(
            NotFoundReason::NoQuadrilaterals.to_string(),
            "no quadrilateral candidates"
        );
        assert_eq!(
            NotFoundReason::BelowThreshold.to_string(),
            "no chart above confidence threshold"
        );
    }

    #[test]
    fn not_found_serializes_with_status_tag() {
        let r = DetectionResult::NotFound(NotFound {
            reason: NotFoundReason::NoQuadrilaterals,
            best_score: None,
        });
        let v = serde_json::to_value(&r).expect("json");
        assert_eq!(v["status"], "not_found");
        assert_eq!(v["reason"], "no_quadrilaterals");
        let back: DetectionResult = serde_json::from_value(v).expect("parse");
        assert_eq!(back, r);
    }
}
