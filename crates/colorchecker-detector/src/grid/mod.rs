//! Grid assembly: quads → clusters → lattices → topology-aligned grids.

mod cluster;
mod lattice;
mod placement;

pub use cluster::cluster_quads;
pub use lattice::{build_lattice, dominant_axis_angle, Lattice, LatticeCell};
pub use placement::{better_of, FootprintSearch, Placement};

use crate::budget::Budget;
use crate::topology::ChartTopology;
use colorchecker_core::{Homography, Quad};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Geometric tolerances of the grid assembler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Neighbours queried per quad when linking clusters.
    pub k_neighbors: usize,
    /// Maximum center distance for a link, relative to the larger quad side.
    pub max_link_ratio: f32,
    /// Maximum side length difference for a link, relative to the larger side.
    pub size_tolerance: f32,
    /// Maximum deviation of a quad's edges from the lattice axes, in degrees.
    pub axis_tolerance_deg: f32,
    /// Maximum rms residual of a placement, in pitch units.
    pub max_residual: f32,
    /// Relative tolerance on the observed pitch / patch side ratio.
    pub spacing_tolerance: f32,
    /// Relative tolerance on the observed pitch aspect ratio.
    pub aspect_tolerance: f32,
    /// Smallest cluster considered.
    pub min_cluster_size: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            k_neighbors: 8,
            max_link_ratio: 2.0,
            size_tolerance: 0.5,
            axis_tolerance_deg: 20.0,
            max_residual: 0.25,
            spacing_tolerance: 0.6,
            aspect_tolerance: 0.35,
            min_cluster_size: 4,
        }
    }
}

/// One cell of a candidate grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub quad: Quad,
    /// `true` when the quad came from the image, `false` when interpolated.
    pub observed: bool,
}

/// A cluster aligned to a topology footprint.
///
/// Cells are row-major over the observed lattice (`rows × cols`), which is
/// the topology's `rows × cols` or, when `transposed`, `cols × rows`.
#[derive(Clone, Debug)]
pub struct CandidateGrid {
    pub topology_index: usize,
    pub cluster_index: usize,
    pub rows: usize,
    pub cols: usize,
    pub transposed: bool,
    pub cells: Vec<GridCell>,
    /// Lattice coordinates → image.
    pub model: Homography,
    pub bounding_quad: Quad,
    pub rms_residual: f32,
    pub total_residual: f32,
    pub matched: usize,
    pub unexplained: usize,
    pub confidence: f32,
}

/// Search inputs shared by every (cluster, topology) pair of one call.
pub struct GridAssembler<'a> {
    pub params: GridParams,
    pub min_observed_fraction: f32,
    pub min_geometric_confidence: f32,
    pub budget: &'a Budget,
}

#[inline]
fn within(observed: f32, expected: f32, tol: f32) -> bool {
    expected > 0.0 && (observed / expected - 1.0).abs() <= tol
}

// Every lattice quad has its edges along the lattice axes.
fn axis_consistent(quads: &[Quad], lattice: &Lattice, tol_deg: f32) -> bool {
    let tol = tol_deg.to_radians();
    let base = lattice.axis_u.y.atan2(lattice.axis_u.x);
    lattice.cells.iter().all(|c| {
        let corners = quads[c.quad_index].corners();
        (0..4).all(|k| {
            let d = corners[(k + 1) % 4] - corners[k];
            let phi = d.y.atan2(d.x) - base;
            let folded = (phi + std::f32::consts::FRAC_PI_4).rem_euclid(std::f32::consts::FRAC_PI_2)
                - std::f32::consts::FRAC_PI_4;
            folded.abs() <= tol
        })
    })
}

impl GridAssembler<'_> {
    fn min_matched(&self, topology: &ChartTopology) -> usize {
        let frac = self.min_observed_fraction.clamp(0.0, 1.0);
        ((frac * topology.patch_count() as f32).ceil() as usize).max(4)
    }

    /// Align one cluster's lattice to one topology.
    pub fn align(
        &self,
        quads: &[Quad],
        lattice: &Lattice,
        topology: &ChartTopology,
        topology_index: usize,
        cluster_index: usize,
    ) -> Option<CandidateGrid> {
        let search = FootprintSearch {
            lattice,
            quads,
            min_matched: self.min_matched(topology),
        };

        let (r, c) = (topology.rows(), topology.cols());
        let observed_aspect = lattice.pitch[0] / lattice.pitch[1];
        let observed_spacing = lattice.mean_pitch() / lattice.median_side;
        if !within(observed_spacing, topology.spacing_ratio(), self.params.spacing_tolerance) {
            debug!(
                "grid: cluster {cluster_index} spacing {observed_spacing:.2} vs {} for {}",
                topology.spacing_ratio(),
                topology.id()
            );
            return None;
        }

        let mut best = None;
        let footprints: &[(usize, usize, bool)] = if r == c {
            &[(r, c, false)]
        } else {
            &[(r, c, false), (c, r, true)]
        };
        for &(fr, fc, transposed) in footprints {
            let expected_aspect = if transposed {
                1.0 / topology.aspect_ratio()
            } else {
                topology.aspect_ratio()
            };
            if !within(observed_aspect, expected_aspect, self.params.aspect_tolerance) {
                continue;
            }
            best = better_of(best, search.best(fr, fc, transposed, self.budget));
        }
        let placement = best?;

        if placement.rms_residual > self.params.max_residual {
            debug!(
                "grid: cluster {cluster_index} rms {:.3} too high for {}",
                placement.rms_residual,
                topology.id()
            );
            return None;
        }
        let confidence = 1.0 - (placement.rms_residual / self.params.max_residual).min(1.0);
        if confidence < self.min_geometric_confidence {
            return None;
        }

        build_candidate(quads, &placement, topology, topology_index, cluster_index, confidence)
    }

    /// Every grid consistent with any topology, one per (cluster, topology).
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(quads = quads.len())))]
    pub fn assemble(&self, quads: &[Quad], topologies: &[ChartTopology]) -> Vec<CandidateGrid> {
        let p = &self.params;
        let clusters = cluster_quads(
            quads,
            p.k_neighbors,
            p.max_link_ratio,
            p.size_tolerance,
            p.min_cluster_size,
        );
        debug!("grid: {} quads in {} clusters", quads.len(), clusters.len());

        let mut grids = Vec::new();
        for (cluster_index, members) in clusters.iter().enumerate() {
            if self.budget.is_exhausted() {
                log::warn!("grid: budget exhausted at cluster {cluster_index}");
                break;
            }
            let Some(lattice) = build_lattice(quads, members, p.max_residual) else {
                continue;
            };
            if !axis_consistent(quads, &lattice, p.axis_tolerance_deg) {
                debug!("grid: cluster {cluster_index} edges disagree with its axes");
                continue;
            }
            for (topology_index, topology) in topologies.iter().enumerate() {
                if let Some(grid) = self.align(quads, &lattice, topology, topology_index, cluster_index) {
                    grids.push(grid);
                }
            }
        }
        grids
    }
}

fn map_quad(model: &Homography, pts: [Point2<f32>; 4]) -> Option<Quad> {
    let mut out = [Point2::origin(); 4];
    for (o, p) in out.iter_mut().zip(pts) {
        *o = model.try_apply(p)?;
    }
    Quad::new(out)
}

// First pair of cells whose quads overlap.
fn first_overlap(cells: &[GridCell]) -> Option<(usize, usize)> {
    (0..cells.len()).find_map(|i| {
        (i + 1..cells.len())
            .find(|&j| cells[i].quad.overlaps(&cells[j].quad))
            .map(|j| (i, j))
    })
}

fn build_candidate(
    quads: &[Quad],
    placement: &Placement,
    topology: &ChartTopology,
    topology_index: usize,
    cluster_index: usize,
    confidence: f32,
) -> Option<CandidateGrid> {
    let (rows, cols) = (placement.rows, placement.cols);
    let half = 0.5 / topology.spacing_ratio();

    let mut cells = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let lr = r as i32 + placement.row_offset;
            let lc = c as i32 + placement.col_offset;
            let hit = placement.matched.iter().find(|m| m.row == lr && m.col == lc);
            let cell = match hit {
                Some(m) => GridCell {
                    quad: quads[m.quad_index],
                    observed: true,
                },
                None => {
                    let (cx, cy) = (c as f32 + 0.5, r as f32 + 0.5);
                    let square = [
                        Point2::new(cx - half, cy - half),
                        Point2::new(cx + half, cy - half),
                        Point2::new(cx + half, cy + half),
                        Point2::new(cx - half, cy + half),
                    ];
                    GridCell {
                        quad: map_quad(&placement.model, square)?,
                        observed: false,
                    }
                }
            };
            cells.push(cell);
        }
    }

    if let Some((i, j)) = first_overlap(&cells) {
        debug!("grid: cluster {cluster_index} cells {i} and {j} overlap for {}", topology.id());
        return None;
    }

    let (fw, fh) = (cols as f32, rows as f32);
    let bounding_quad = map_quad(
        &placement.model,
        [
            Point2::new(0.0, 0.0),
            Point2::new(fw, 0.0),
            Point2::new(fw, fh),
            Point2::new(0.0, fh),
        ],
    )?;

    Some(CandidateGrid {
        topology_index,
        cluster_index,
        rows,
        cols,
        transposed: placement.transposed,
        cells,
        model: placement.model,
        bounding_quad,
        rms_residual: placement.rms_residual,
        total_residual: placement.total_residual,
        matched: placement.matched.len(),
        unexplained: placement.unexplained,
        confidence,
    })
}
