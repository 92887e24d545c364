//! Orientation search against reference colors and match scoring.

use crate::sample::PatchSample;
use crate::topology::ChartTopology;
use colorchecker_core::{rgb_to_lab, ColorMetric, Encoding, Orientation, ALL_ORIENTATIONS};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    pub metric: ColorMetric,
    /// Per-patch distances are capped at this value before summing.
    pub max_patch_distance: f32,
    /// Mean distance at which the color term of the score halves.
    pub distance_scale: f32,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            metric: ColorMetric::Ciede2000,
            max_patch_distance: 50.0,
            distance_scale: 10.0,
        }
    }
}

/// Best orientation of one grid against one topology.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub orientation: Orientation,
    /// `confidence / (1 + mean_distance / distance_scale)`, in `[0, 1]`.
    pub score: f32,
    pub mean_distance: f32,
    /// Sample index of each reference patch, in reference order.
    pub sample_index: Vec<usize>,
    /// Sample Lab and capped distance per reference patch, in reference order.
    pub lab: Vec<[f32; 3]>,
    pub distances: Vec<f32>,
}

/// Convert samples to Lab once per grid.
pub fn samples_to_lab(samples: &[PatchSample], encoding: Encoding) -> Vec<[f32; 3]> {
    samples.iter().map(|s| rgb_to_lab(s.rgb, encoding)).collect()
}

/// Try all 8 orientations whose observed shape matches `(obs_rows, obs_cols)`.
///
/// The orientation with the smallest total distance wins; on exact ties the
/// earlier one in [`ALL_ORIENTATIONS`] is kept.
pub fn match_orientation(
    sample_lab: &[[f32; 3]],
    obs_rows: usize,
    obs_cols: usize,
    topology: &ChartTopology,
    confidence: f32,
    params: &MatcherParams,
) -> Option<MatchOutcome> {
    let (rows, cols) = (topology.rows(), topology.cols());
    let reference = topology.reference_lab();
    if sample_lab.len() != rows * cols {
        return None;
    }

    let mut best: Option<(Orientation, f32, Vec<usize>, Vec<f32>)> = None;
    for orientation in ALL_ORIENTATIONS {
        if orientation.observed_dims(rows, cols) != (obs_rows, obs_cols) {
            continue;
        }
        let map = orientation.index_map(rows, cols);
        let distances: Vec<f32> = map
            .iter()
            .zip(reference)
            .map(|(&obs, ref_lab)| {
                params
                    .metric
                    .distance(sample_lab[obs], *ref_lab)
                    .min(params.max_patch_distance)
            })
            .collect();
        let total: f32 = distances.iter().sum();
        let better = match &best {
            Some((_, t, _, _)) => total < *t,
            None => true,
        };
        if better {
            best = Some((orientation, total, map, distances));
        }
    }

    let (orientation, total, map, distances) = best?;
    let mean_distance = total / distances.len() as f32;
    let score = (confidence.clamp(0.0, 1.0) / (1.0 + mean_distance / params.distance_scale)).clamp(0.0, 1.0);
    Some(MatchOutcome {
        orientation,
        score,
        mean_distance,
        lab: map.iter().map(|&i| sample_lab[i]).collect(),
        sample_index: map,
        distances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ChartTopologySpec, ReferenceColor};
    use colorchecker_core::Rotation;

    // 2×3 chart with six clearly distinct colors.
    fn topology() -> ChartTopology {
        let colors = [
            [200, 30, 30],
            [30, 200, 30],
            [30, 30, 200],
            [220, 220, 40],
            [40, 220, 220],
            [220, 40, 220],
        ]
        .map(ReferenceColor::Srgb8)
        .to_vec();
        ChartTopology::new(ChartTopologySpec {
            id: "six".into(),
            rows: 2,
            cols: 3,
            spacing_ratio: 1.25,
            aspect_ratio: 1.0,
            colors,
        })
        .expect("topology")
    }

    // Observed lab per observed index for a chart seen in `o`.
    fn observe(t: &ChartTopology, o: Orientation) -> (Vec<[f32; 3]>, usize, usize) {
        let (r, c) = o.observed_dims(t.rows(), t.cols());
        let mut lab = vec![[0.0; 3]; r * c];
        for (k, obs) in o.index_map(t.rows(), t.cols()).into_iter().enumerate() {
            lab[obs] = t.reference_lab()[k];
        }
        (lab, r, c)
    }

    #[test]
    fn recovers_every_orientation() {
        let t = topology();
        for o in ALL_ORIENTATIONS {
            let (lab, r, c) = observe(&t, o);
            let m = match_orientation(&lab, r, c, &t, 1.0, &MatcherParams::default()).expect("match");
            assert_eq!(m.orientation, o);
            assert!(m.mean_distance < 1e-3);
            assert!((m.score - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn score_scales_with_confidence_and_distance() {
        let t = topology();
        let (lab, r, c) = observe(&t, Orientation::new(Rotation::Deg180, false));
        let m = match_orientation(&lab, r, c, &t, 0.5, &MatcherParams::default()).expect("match");
        assert!((m.score - 0.5).abs() < 1e-3);

        // Uniform gray: every orientation is equally bad, the first wins.
        let gray = vec![[50.0, 0.0, 0.0]; 6];
        let m = match_orientation(&gray, 2, 3, &t, 1.0, &MatcherParams::default()).expect("match");
        assert_eq!(m.orientation, Orientation::IDENTITY);
        assert!(m.score < 0.5);
        assert!(m.distances.iter().all(|d| *d <= 50.0));
    }

    #[test]
    fn shape_mismatch_yields_nothing() {
        let t = topology();
        assert!(match_orientation(&[[0.0; 3]; 4], 2, 2, &t, 1.0, &MatcherParams::default()).is_none());
    }
}
