use super::select::{compare, select, ScoredCandidate};
use super::{
    CandidateSummary, ConfigError, DetectError, Detection, DetectionDiagnostics, DetectionResult,
    DetectorConfig, PatchColor,
};
use crate::budget::Budget;
use crate::contour::ContourExtractor;
use crate::grid::{CandidateGrid, GridAssembler};
use crate::matcher::{match_orientation, samples_to_lab};
use crate::sample::sample_grid;
use crate::topology::ChartTopology;
use colorchecker_core::{normalize, NormalizedImage, Quad, Raster};
use log::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Color chart detector with a validated configuration.
///
/// Holds no per-call state; one instance can serve many images, from
/// several threads.
#[derive(Clone, Debug)]
pub struct ChartDetector {
    config: DetectorConfig,
}

impl ChartDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate the best chart of any of `topologies` in `raster`.
    pub fn detect(
        &self,
        raster: &Raster<'_>,
        topologies: &[ChartTopology],
    ) -> Result<DetectionResult, DetectError> {
        self.detect_with_diagnostics(raster, topologies)
            .map(|(result, _)| result)
    }

    /// Same as [`ChartDetector::detect`], also returning per-stage counts.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(w = raster.width(), h = raster.height()))
    )]
    pub fn detect_with_diagnostics(
        &self,
        raster: &Raster<'_>,
        topologies: &[ChartTopology],
    ) -> Result<(DetectionResult, DetectionDiagnostics), DetectError> {
        if topologies.is_empty() {
            return Err(DetectError::NoTopologies);
        }
        let image = normalize(raster)?;
        let cfg = &self.config;
        let budget = Budget::new(cfg.time_budget(), cfg.max_iterations);

        let gray = image.gray.view();
        let extractor = ContourExtractor::new(&gray, &cfg.edge_params(), cfg.contour);
        let quads: Vec<Quad> = extractor.quads(&budget).collect();
        debug!("detect: {} quad candidates", quads.len());

        let assembler = GridAssembler {
            params: cfg.grid,
            min_observed_fraction: cfg.min_observed_fraction,
            min_geometric_confidence: cfg.min_geometric_confidence,
            budget: &budget,
        };
        let grids = assembler.assemble(&quads, topologies);
        debug!("detect: {} candidate grids", grids.len());
        let grid_count = grids.len();

        #[cfg(feature = "rayon")]
        let scored: Vec<ScoredCandidate> = grids
            .into_par_iter()
            .filter_map(|g| self.score(&image, g, topologies))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let scored: Vec<ScoredCandidate> = grids
            .into_iter()
            .filter_map(|g| self.score(&image, g, topologies))
            .collect();

        let diagnostics = DetectionDiagnostics {
            quad_count: quads.len(),
            grid_count,
            candidates: summarize(&scored, topologies),
            iterations: budget.iterations(),
            budget_exhausted: budget.is_exhausted(),
        };

        let result = match select(&scored, cfg.min_match_score) {
            Ok(best) => {
                let d = build_detection(&scored[best], topologies);
                debug!(
                    "detect: found {} ({}) score {:.3}",
                    d.topology_id, d.orientation, d.match_score
                );
                DetectionResult::Found(d)
            }
            Err(not_found) => {
                debug!("detect: {}", not_found.reason);
                DetectionResult::NotFound(not_found)
            }
        };
        Ok((result, diagnostics))
    }

    fn score(
        &self,
        image: &NormalizedImage,
        grid: CandidateGrid,
        topologies: &[ChartTopology],
    ) -> Option<ScoredCandidate> {
        let topology = &topologies[grid.topology_index];
        let samples = sample_grid(
            &image.rgb,
            &grid,
            &self.config.sampler,
            self.config.color_outlier_trim_percent,
        )?;
        let lab = samples_to_lab(&samples, image.encoding);
        let outcome = match_orientation(
            &lab,
            grid.rows,
            grid.cols,
            topology,
            grid.confidence,
            &self.config.matcher,
        )?;
        Some(ScoredCandidate {
            grid,
            samples,
            outcome,
        })
    }
}

fn summarize(scored: &[ScoredCandidate], topologies: &[ChartTopology]) -> Vec<CandidateSummary> {
    let mut order: Vec<&ScoredCandidate> = scored.iter().collect();
    order.sort_by(|a, b| compare(a, b));
    order
        .into_iter()
        .map(|c| CandidateSummary {
            topology_id: topologies[c.grid.topology_index].id().to_string(),
            cluster_index: c.grid.cluster_index,
            orientation: c.outcome.orientation,
            score: c.outcome.score,
            geometric_confidence: c.grid.confidence,
            mean_distance: c.outcome.mean_distance,
            matched: c.grid.matched,
        })
        .collect()
}

fn build_detection(best: &ScoredCandidate, topologies: &[ChartTopology]) -> Detection {
    let topology = &topologies[best.grid.topology_index];
    let outcome = &best.outcome;
    let patches = outcome
        .sample_index
        .iter()
        .enumerate()
        .map(|(k, &i)| {
            let s = &best.samples[i];
            PatchColor {
                reference_index: k,
                quad: s.quad,
                rgb: s.rgb,
                variance: s.variance,
                lab: outcome.lab[k],
                distance: outcome.distances[k],
                observed: s.observed,
                synthesized: s.synthesized,
            }
        })
        .collect();

    Detection {
        topology_id: topology.id().to_string(),
        bounding_quad: best.grid.bounding_quad,
        orientation: outcome.orientation,
        patches,
        match_score: outcome.score,
        geometric_confidence: best.grid.confidence,
        mean_distance: outcome.mean_distance,
    }
}

/// One-shot detection: validate `config`, then run [`ChartDetector::detect`].
pub fn detect(
    raster: &Raster<'_>,
    topologies: &[ChartTopology],
    config: &DetectorConfig,
) -> Result<DetectionResult, DetectError> {
    ChartDetector::new(config.clone())?.detect(raster, topologies)
}
