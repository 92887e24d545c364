//! Best-alignment search of a topology footprint over a lattice.

use super::lattice::{Lattice, LatticeCell};
use crate::budget::Budget;
use colorchecker_core::{estimate_homography, fit_affine, Homography, Quad};
use nalgebra::Point2;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Where a `rows × cols` footprint sits on the lattice, and how well it fits.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Footprint size in observed lattice orientation.
    pub rows: usize,
    pub cols: usize,
    pub transposed: bool,
    /// Lattice coordinates of the footprint's top-left cell.
    pub row_offset: i32,
    pub col_offset: i32,
    /// Footprint cell coordinates → image, cell `(r, c)` spanning `[c, c+1] × [r, r+1]`.
    pub model: Homography,
    /// Lattice cells inside the footprint.
    pub matched: Vec<LatticeCell>,
    pub unexplained: usize,
    pub rms_residual: f32,
    pub total_residual: f32,
}

impl Placement {
    /// Ordering key: better placements compare as `Less`.
    fn rank(&self, other: &Placement) -> Ordering {
        self.total_residual
            .total_cmp(&other.total_residual)
            .then(other.matched.len().cmp(&self.matched.len()))
            .then(self.transposed.cmp(&other.transposed))
            .then((self.row_offset, self.col_offset).cmp(&(other.row_offset, other.col_offset)))
    }
}

/// Inputs of one search that do not change between placements.
pub struct FootprintSearch<'a> {
    pub lattice: &'a Lattice,
    pub quads: &'a [Quad],
    pub min_matched: usize,
}

fn offset_range(extent: usize, size: usize) -> std::ops::RangeInclusive<i32> {
    let slack = extent as i32 - size as i32;
    slack.min(0)..=slack.max(0)
}

fn fit_model(src: &[Point2<f32>], dst: &[Point2<f32>], cells: &[LatticeCell]) -> Option<Homography> {
    let rows: BTreeSet<i32> = cells.iter().map(|c| c.row).collect();
    let cols: BTreeSet<i32> = cells.iter().map(|c| c.col).collect();
    if rows.len() >= 2 && cols.len() >= 2 && src.len() >= 4 {
        if let Some(h) = estimate_homography(src, dst) {
            return Some(h);
        }
    }
    fit_affine(src, dst)
}

impl FootprintSearch<'_> {
    fn evaluate(&self, rows: usize, cols: usize, transposed: bool, oy: i32, ox: i32) -> Option<Placement> {
        let matched: Vec<LatticeCell> = self
            .lattice
            .cells
            .iter()
            .copied()
            .filter(|c| {
                c.row >= oy && c.row < oy + rows as i32 && c.col >= ox && c.col < ox + cols as i32
            })
            .collect();
        if matched.len() < self.min_matched {
            return None;
        }

        let src: Vec<Point2<f32>> = matched
            .iter()
            .map(|c| Point2::new((c.col - ox) as f32 + 0.5, (c.row - oy) as f32 + 0.5))
            .collect();
        let dst: Vec<Point2<f32>> = matched
            .iter()
            .map(|c| self.quads[c.quad_index].center())
            .collect();
        let model = fit_model(&src, &dst, &matched)?;

        let pitch = self.lattice.mean_pitch();
        let mut sum_sq = 0.0f32;
        for (s, d) in src.iter().zip(dst.iter()) {
            let r = (model.try_apply(*s)? - d).norm() / pitch;
            sum_sq += r * r;
        }
        let unexplained = self.lattice.cells.len() - matched.len();
        Some(Placement {
            rows,
            cols,
            transposed,
            row_offset: oy,
            col_offset: ox,
            model,
            rms_residual: (sum_sq / matched.len() as f32).sqrt(),
            total_residual: sum_sq + unexplained as f32,
            matched,
            unexplained,
        })
    }

    /// Slide the footprint over every offset that overlaps the lattice
    /// extent and keep the best placement. One budget tick per placement.
    pub fn best(&self, rows: usize, cols: usize, transposed: bool, budget: &Budget) -> Option<Placement> {
        let mut best: Option<Placement> = None;
        for oy in offset_range(self.lattice.rows, rows) {
            for ox in offset_range(self.lattice.cols, cols) {
                if !budget.tick() {
                    return best;
                }
                let Some(p) = self.evaluate(rows, cols, transposed, oy, ox) else {
                    continue;
                };
                let better = match &best {
                    Some(b) => p.rank(b) == Ordering::Less,
                    None => true,
                };
                if better {
                    best = Some(p);
                }
            }
        }
        best
    }
}

/// Pick the better of two optional placements.
pub fn better_of(a: Option<Placement>, b: Option<Placement>) -> Option<Placement> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.rank(&a) == Ordering::Less { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}
