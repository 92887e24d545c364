use super::ConfigError;
use crate::contour::{ContourParams, EdgeParams, EdgeThresholds};
use crate::grid::GridParams;
use crate::matcher::MatcherParams;
use crate::sample::SamplerParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the color chart detector.
///
/// Every field has a documented default; missing JSON fields take it.
/// `edge_thresholds` and `adaptive_edges` take precedence over the matching
/// fields of the nested `edges` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Hysteresis thresholds on the Sobel magnitude (default 40 / 100).
    pub edge_thresholds: EdgeThresholds,
    /// Scale the thresholds with image contrast (default `false`).
    pub adaptive_edges: bool,
    /// Grids with a lower geometric confidence are discarded (default 0.3).
    pub min_geometric_confidence: f32,
    /// Best scores below this are reported as not found (default 0.5).
    pub min_match_score: f32,
    /// Wall-clock limit for one call; `None` is unlimited.
    pub time_budget_ms: Option<u64>,
    /// Work-unit limit for one call; `None` is unlimited.
    pub max_iterations: Option<usize>,
    /// Percent of pixels dropped from each luma extreme of a patch, in `[0, 50)` (default 10).
    pub color_outlier_trim_percent: f32,
    /// Fraction of cells that must be directly observed, in `(0, 1]` (default 0.6).
    pub min_observed_fraction: f32,
    pub edges: EdgeParams,
    pub contour: ContourParams,
    pub grid: GridParams,
    pub sampler: SamplerParams,
    pub matcher: MatcherParams,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            edge_thresholds: EdgeThresholds::default(),
            adaptive_edges: false,
            min_geometric_confidence: 0.3,
            min_match_score: 0.5,
            time_budget_ms: None,
            max_iterations: None,
            color_outlier_trim_percent: 10.0,
            min_observed_fraction: 0.6,
            edges: EdgeParams::default(),
            contour: ContourParams::default(),
            grid: GridParams::default(),
            sampler: SamplerParams::default(),
            matcher: MatcherParams::default(),
        }
    }
}

fn in_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            range: "[0, 1]",
            value,
        })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name })
    }
}

impl DetectorConfig {
    /// Check every tolerance; the detector only runs on validated configs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let EdgeThresholds { low, high } = self.edge_thresholds;
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(ConfigError::EdgeThresholds { low, high });
        }
        in_unit("min_geometric_confidence", self.min_geometric_confidence)?;
        in_unit("min_match_score", self.min_match_score)?;

        let trim = self.color_outlier_trim_percent;
        if !(trim.is_finite() && (0.0..50.0).contains(&trim)) {
            return Err(ConfigError::OutOfRange {
                name: "color_outlier_trim_percent",
                range: "[0, 50)",
                value: trim,
            });
        }
        let frac = self.min_observed_fraction;
        if !(frac.is_finite() && frac > 0.0 && frac <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "min_observed_fraction",
                range: "(0, 1]",
                value: frac,
            });
        }
        if self.time_budget_ms == Some(0) {
            return Err(ConfigError::NonPositive {
                name: "time_budget_ms",
            });
        }

        let c = &self.contour;
        positive("contour.approx_epsilon_frac", c.approx_epsilon_frac)?;
        positive("contour.min_quad_area", c.min_quad_area)?;
        in_unit("contour.max_quad_area_frac", c.max_quad_area_frac)?;
        positive("contour.min_fill_ratio", c.min_fill_ratio)?;
        if c.max_fill_ratio.is_nan() || c.max_fill_ratio < c.min_fill_ratio {
            return Err(ConfigError::OutOfRange {
                name: "contour.max_fill_ratio",
                range: "[min_fill_ratio, inf)",
                value: c.max_fill_ratio,
            });
        }
        if c.max_quad_aspect.is_nan() || c.max_quad_aspect < 1.0 {
            return Err(ConfigError::OutOfRange {
                name: "contour.max_quad_aspect",
                range: "[1, inf)",
                value: c.max_quad_aspect,
            });
        }

        let g = &self.grid;
        if g.k_neighbors == 0 {
            return Err(ConfigError::NonPositive {
                name: "grid.k_neighbors",
            });
        }
        positive("grid.max_link_ratio", g.max_link_ratio)?;
        positive("grid.size_tolerance", g.size_tolerance)?;
        positive("grid.axis_tolerance_deg", g.axis_tolerance_deg)?;
        positive("grid.max_residual", g.max_residual)?;
        positive("grid.spacing_tolerance", g.spacing_tolerance)?;
        positive("grid.aspect_tolerance", g.aspect_tolerance)?;

        if !(self.sampler.margin_frac.is_finite() && (0.0..1.0).contains(&self.sampler.margin_frac)) {
            return Err(ConfigError::OutOfRange {
                name: "sampler.margin_frac",
                range: "[0, 1)",
                value: self.sampler.margin_frac,
            });
        }
        positive("matcher.max_patch_distance", self.matcher.max_patch_distance)?;
        positive("matcher.distance_scale", self.matcher.distance_scale)?;
        Ok(())
    }

    /// Edge stage parameters with the top-level overrides applied.
    pub fn edge_params(&self) -> EdgeParams {
        EdgeParams {
            thresholds: self.edge_thresholds,
            adaptive: self.adaptive_edges,
            ..self.edges
        }
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let cfg = DetectorConfig {
            edge_thresholds: EdgeThresholds {
                low: 120.0,
                high: 60.0,
            },
            ..DetectorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EdgeThresholds { .. })));
    }

    #[test]
    fn rejects_out_of_range_tuning() {
        let cfg = DetectorConfig {
            color_outlier_trim_percent: 50.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                name: "color_outlier_trim_percent",
                ..
            })
        ));

        let cfg = DetectorConfig {
            min_observed_fraction: 0.0,
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = DetectorConfig::default();
        cfg.matcher.distance_scale = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                name: "matcher.distance_scale"
            })
        );
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "min_match_score": 0.7, "grid": { "max_residual": 0.3 } }"#)
                .expect("json");
        assert_eq!(cfg.min_match_score, 0.7);
        assert_eq!(cfg.grid.max_residual, 0.3);
        assert_eq!(cfg.grid.k_neighbors, GridParams::default().k_neighbors);
        assert_eq!(cfg.color_outlier_trim_percent, 10.0);
    }

    #[test]
    fn top_level_edge_fields_win() {
        let mut cfg = DetectorConfig {
            adaptive_edges: true,
            ..DetectorConfig::default()
        };
        cfg.edges.adaptive = false;
        cfg.edges.dilate = 2;
        let e = cfg.edge_params();
        assert!(e.adaptive);
        assert_eq!(e.dilate, 2);
    }
}
