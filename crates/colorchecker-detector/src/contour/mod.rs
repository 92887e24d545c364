//! Candidate quadrilaterals from the luma image.
//!
//! Pipeline: edge mask → 4-connected labelling of the remaining pixels →
//! Moore tracing of each enclosed region → closed Douglas–Peucker → shape
//! filters. Regions touching the image border are background and skipped.

mod edges;
mod regions;
mod simplify;
mod trace;

pub use edges::{edge_mask, EdgeParams, EdgeThresholds};
pub use regions::{label_regions, Component, Regions};
pub use simplify::{perimeter, simplify_closed};
pub use trace::trace_boundary;

use crate::budget::Budget;
use colorchecker_core::{GrayImageView, Quad};
use log::{debug, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Polygon approximation and shape filters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// Douglas–Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f32,
    /// Minimum polygon area in square pixels.
    pub min_quad_area: f32,
    /// Maximum polygon area as a fraction of the image area.
    pub max_quad_area_frac: f32,
    /// Bounds on region pixel count over polygon pixel coverage.
    pub min_fill_ratio: f32,
    pub max_fill_ratio: f32,
    /// Maximum ratio of the longer to the shorter pair of opposite sides.
    pub max_quad_aspect: f32,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            approx_epsilon_frac: 0.04,
            min_quad_area: 64.0,
            max_quad_area_frac: 0.25,
            min_fill_ratio: 0.8,
            max_fill_ratio: 1.4,
            max_quad_aspect: 3.0,
        }
    }
}

/// Edge analysis of one image; hands out quad candidates lazily.
pub struct ContourExtractor {
    regions: Regions,
    params: ContourParams,
}

impl ContourExtractor {
    /// Run the edge and labelling stages.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(w = gray.width, h = gray.height))
    )]
    pub fn new(gray: &GrayImageView<'_>, edges: &EdgeParams, params: ContourParams) -> Self {
        let mask = edge_mask(gray, edges);
        let regions = label_regions(&mask, gray.width, gray.height);
        debug!(
            "contour: {} regions ({} enclosed)",
            regions.components.len(),
            regions
                .components
                .iter()
                .filter(|c| !c.touches_border)
                .count()
        );
        Self { regions, params }
    }

    /// Fresh iterator over quadrilateral candidates, in region discovery order.
    ///
    /// Each region consumes one budget tick; iteration ends early once the
    /// budget is exhausted.
    pub fn quads<'a>(&'a self, budget: &'a Budget) -> QuadIter<'a> {
        QuadIter {
            extractor: self,
            budget,
            next: 0,
        }
    }

    fn max_area(&self) -> f32 {
        self.params.max_quad_area_frac * (self.regions.width * self.regions.height) as f32
    }

    /// Try to turn one region into a quadrilateral.
    pub fn quad_for(&self, comp: &Component) -> Option<Quad> {
        let p = &self.params;
        if comp.touches_border {
            return None;
        }
        // Cheap pre-filter on pixel count before tracing.
        let pixels = comp.pixel_count as f32;
        if pixels < p.min_quad_area || pixels > self.max_area() * p.max_fill_ratio + 1.0 {
            return None;
        }

        let [x0, y0, x1, y1] = comp.bbox;
        let max_steps = 4 * ((x1 - x0 + 1) + (y1 - y0 + 1)) + 16;
        let contour: Vec<Point2<f32>> = trace_boundary(&self.regions, comp, max_steps)
            .into_iter()
            .map(|[x, y]| Point2::new(x as f32, y as f32))
            .collect();
        if contour.len() < 4 {
            return None;
        }

        let eps = p.approx_epsilon_frac * perimeter(&contour);
        let poly = simplify_closed(&contour, eps);
        let corners: [Point2<f32>; 4] = poly.as_slice().try_into().ok()?;
        let quad = Quad::new(corners)?;

        let area = quad.area();
        if area < p.min_quad_area || area > self.max_area() {
            return None;
        }
        // The polygon runs through boundary pixel centers; half its
        // perimeter plus one recovers the covered pixel count (Pick).
        let sides = quad.side_lengths();
        let coverage = area + 0.5 * sides.iter().sum::<f32>() + 1.0;
        let fill = pixels / coverage;
        if fill < p.min_fill_ratio || fill > p.max_fill_ratio {
            return None;
        }
        if quad.aspect() > p.max_quad_aspect {
            return None;
        }
        Some(quad)
    }
}

/// Lazy quad sequence produced by [`ContourExtractor::quads`].
pub struct QuadIter<'a> {
    extractor: &'a ContourExtractor,
    budget: &'a Budget,
    next: usize,
}

impl Iterator for QuadIter<'_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        let comps = &self.extractor.regions.components;
        while self.next < comps.len() {
            let comp = &comps[self.next];
            self.next += 1;
            if comp.touches_border {
                continue;
            }
            if !self.budget.tick() {
                warn!(
                    "contour: budget exhausted after {} of {} regions",
                    self.next - 1,
                    comps.len()
                );
                self.next = comps.len();
                return None;
            }
            if let Some(q) = self.extractor.quad_for(comp) {
                return Some(q);
            }
        }
        None
    }
}
