//! Integer lattice coordinates for a cluster of patch quads.

use colorchecker_core::{estimate_homography, fit_affine, Homography, Quad};
use nalgebra::{Point2, Vector2};

/// One quad placed on the lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeCell {
    pub quad_index: usize,
    pub row: i32,
    pub col: i32,
    /// Distance to the fitted lattice position, in pitch units.
    pub residual: f32,
}

/// Cluster members indexed by (row, col), normalized so the minimum row and
/// column are 0. Column index grows along `axis_u`, row index along `axis_v`.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub cells: Vec<LatticeCell>,
    pub rows: usize,
    pub cols: usize,
    /// Center-to-center distance along the two axes, in pixels.
    pub pitch: [f32; 2],
    pub axis_u: Vector2<f32>,
    pub axis_v: Vector2<f32>,
    /// Median quad side (square root of area), in pixels.
    pub median_side: f32,
}

impl Lattice {
    #[inline]
    pub fn mean_pitch(&self) -> f32 {
        0.5 * (self.pitch[0] + self.pitch[1])
    }

    pub fn cell_at(&self, row: i32, col: i32) -> Option<&LatticeCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    Some(values[values.len() / 2])
}

/// Dominant edge direction in `(-45°, 45°]`, from length-weighted
/// quadruple-angle averaging over every quad side.
pub fn dominant_axis_angle(quads: &[Quad], members: &[usize]) -> f32 {
    let (mut s, mut c) = (0.0f64, 0.0f64);
    for &i in members {
        let corners = quads[i].corners();
        for k in 0..4 {
            let d = corners[(k + 1) % 4] - corners[k];
            let len = d.norm() as f64;
            let phi = (d.y as f64).atan2(d.x as f64);
            s += len * (4.0 * phi).sin();
            c += len * (4.0 * phi).cos();
        }
    }
    (s.atan2(c) / 4.0) as f32
}

// Median over quads of the distance to the nearest neighbour lying along `axis`.
fn axis_pitch(centers: &[Point2<f32>], axis: Vector2<f32>, other: Vector2<f32>) -> Option<f32> {
    let mut nearest = Vec::with_capacity(centers.len());
    for (i, a) in centers.iter().enumerate() {
        let mut best = f32::INFINITY;
        for (j, b) in centers.iter().enumerate() {
            if i == j {
                continue;
            }
            let d = b - a;
            let along = d.dot(&axis).abs();
            let across = d.dot(&other).abs();
            if along > 1e-3 && across < 0.3 * along {
                best = best.min(along);
            }
        }
        if best.is_finite() {
            nearest.push(best);
        }
    }
    median(&mut nearest)
}

fn assign(
    model: &Homography,
    centers: &[Point2<f32>],
    members: &[usize],
    pitch: f32,
) -> Option<Vec<LatticeCell>> {
    let inv = model.inverse()?;
    let mut cells = Vec::with_capacity(members.len());
    for (k, &quad_index) in members.iter().enumerate() {
        let l = inv.try_apply(centers[k])?;
        let col = (l.x - 0.5).round() as i32;
        let row = (l.y - 0.5).round() as i32;
        let fitted = model.try_apply(Point2::new(col as f32 + 0.5, row as f32 + 0.5))?;
        cells.push(LatticeCell {
            quad_index,
            row,
            col,
            residual: (fitted - centers[k]).norm() / pitch,
        });
    }
    Some(cells)
}

fn refit(cells: &[LatticeCell], centers_by_quad: impl Fn(usize) -> Point2<f32>) -> Option<Homography> {
    let src: Vec<Point2<f32>> = cells
        .iter()
        .map(|c| Point2::new(c.col as f32 + 0.5, c.row as f32 + 0.5))
        .collect();
    let dst: Vec<Point2<f32>> = cells.iter().map(|c| centers_by_quad(c.quad_index)).collect();

    let rows: std::collections::BTreeSet<i32> = cells.iter().map(|c| c.row).collect();
    let cols: std::collections::BTreeSet<i32> = cells.iter().map(|c| c.col).collect();
    if rows.len() >= 2 && cols.len() >= 2 && cells.len() >= 4 {
        if let Some(h) = estimate_homography(&src, &dst) {
            return Some(h);
        }
    }
    fit_affine(&src, &dst)
}

/// Build the lattice of one cluster.
///
/// `max_residual` is in pitch units; quads farther than twice that from
/// their lattice position are dropped, and when two quads claim the same
/// cell the one with the lower residual stays.
pub fn build_lattice(quads: &[Quad], members: &[usize], max_residual: f32) -> Option<Lattice> {
    if members.len() < 2 {
        return None;
    }
    let centers: Vec<Point2<f32>> = members.iter().map(|&i| quads[i].center()).collect();
    let center_of = |quad_index: usize| {
        let k = members.iter().position(|&m| m == quad_index).unwrap_or(0);
        centers[k]
    };

    let theta = dominant_axis_angle(quads, members);
    let u = Vector2::new(theta.cos(), theta.sin());
    let v = Vector2::new(-theta.sin(), theta.cos());

    let pu = axis_pitch(&centers, u, v);
    let pv = axis_pitch(&centers, v, u);
    let (pitch_u, pitch_v) = match (pu, pv) {
        (Some(a), Some(b)) => (a, b),
        (Some(a), None) => (a, a),
        (None, Some(b)) => (b, b),
        (None, None) => return None,
    };

    // Anchor: the member closest to the centroid.
    let centroid = centers.iter().fold(Vector2::zeros(), |acc, c| acc + c.coords) / centers.len() as f32;
    let anchor = (0..centers.len())
        .min_by(|&a, &b| {
            let da = (centers[a].coords - centroid).norm_squared();
            let db = (centers[b].coords - centroid).norm_squared();
            da.total_cmp(&db)
        })
        .unwrap_or(0);
    let origin = centers[anchor];

    // Initial guess: anchor cell at lattice (0, 0).
    let a = [
        [(u.x * pitch_u) as f64, (v.x * pitch_v) as f64],
        [(u.y * pitch_u) as f64, (v.y * pitch_v) as f64],
    ];
    let t = [
        origin.x as f64 - 0.5 * (a[0][0] + a[0][1]),
        origin.y as f64 - 0.5 * (a[1][0] + a[1][1]),
    ];
    let mut model = Homography::from_affine(a, t);
    let pitch = 0.5 * (pitch_u + pitch_v);

    let mut cells = assign(&model, &centers, members, pitch)?;
    // Two refinement passes: the first mostly fixes scale, the second perspective.
    for _ in 0..2 {
        let inliers: Vec<LatticeCell> = cells
            .iter()
            .copied()
            .filter(|c| c.residual <= 2.0 * max_residual)
            .collect();
        let Some(refined) = refit(&inliers, &center_of) else {
            break;
        };
        model = refined;
        cells = assign(&model, &centers, members, pitch)?;
    }

    cells.retain(|c| c.residual <= 2.0 * max_residual);
    cells.sort_by(|a, b| {
        (a.row, a.col)
            .cmp(&(b.row, b.col))
            .then(a.residual.total_cmp(&b.residual))
            .then(a.quad_index.cmp(&b.quad_index))
    });
    cells.dedup_by(|later, earlier| later.row == earlier.row && later.col == earlier.col);
    if cells.len() < 2 {
        return None;
    }

    let min_row = cells.iter().map(|c| c.row).min()?;
    let min_col = cells.iter().map(|c| c.col).min()?;
    for c in &mut cells {
        c.row -= min_row;
        c.col -= min_col;
    }
    let rows = cells.iter().map(|c| c.row).max()? as usize + 1;
    let cols = cells.iter().map(|c| c.col).max()? as usize + 1;

    let mut sides: Vec<f32> = cells.iter().map(|c| quads[c.quad_index].side()).collect();
    let median_side = median(&mut sides)?;

    Some(Lattice {
        cells,
        rows,
        cols,
        pitch: [pitch_u, pitch_v],
        axis_u: u,
        axis_v: v,
        median_side,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated_square(c: Point2<f32>, side: f32, theta: f32) -> Quad {
        let (s, co) = theta.sin_cos();
        let h = side / 2.0;
        let corners = [[-h, -h], [h, -h], [h, h], [-h, h]]
            .map(|[x, y]| Point2::new(c.x + co * x - s * y, c.y + s * x + co * y));
        Quad::new(corners).expect("square")
    }

    fn grid(rows: usize, cols: usize, pitch: f32, side: f32, theta: f32) -> Vec<Quad> {
        let (s, co) = theta.sin_cos();
        let mut out = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let (x, y) = (c as f32 * pitch, r as f32 * pitch);
                let center = Point2::new(200.0 + co * x - s * y, 100.0 + s * x + co * y);
                out.push(rotated_square(center, side, theta));
            }
        }
        out
    }

    #[test]
    fn axis_angle_is_folded_into_quarter_turn() {
        let quads = grid(2, 2, 50.0, 35.0, 0.2);
        let theta = dominant_axis_angle(&quads, &[0, 1, 2, 3]);
        assert!((theta - 0.2).abs() < 1e-4);

        let quads = grid(2, 2, 50.0, 35.0, 0.2 + std::f32::consts::FRAC_PI_2);
        let theta = dominant_axis_angle(&quads, &[0, 1, 2, 3]);
        assert!((theta - 0.2).abs() < 1e-4);
    }

    #[test]
    fn regular_rotated_grid_gets_row_major_coordinates() {
        let quads = grid(4, 6, 50.0, 35.0, 0.15);
        let members: Vec<usize> = (0..quads.len()).collect();
        let lattice = build_lattice(&quads, &members, 0.25).expect("lattice");
        assert_eq!((lattice.rows, lattice.cols), (4, 6));
        assert_eq!(lattice.cells.len(), 24);
        for cell in &lattice.cells {
            assert_eq!(cell.quad_index, cell.row as usize * 6 + cell.col as usize);
            assert!(cell.residual < 1e-3);
        }
        assert!((lattice.pitch[0] - 50.0).abs() < 1e-2);
    }

    #[test]
    fn holes_keep_their_lattice_position() {
        let quads = grid(3, 3, 40.0, 28.0, 0.0);
        // Drop the center and the top-left patch.
        let members = vec![1, 2, 3, 5, 6, 7, 8];
        let lattice = build_lattice(&quads, &members, 0.25).expect("lattice");
        assert_eq!((lattice.rows, lattice.cols), (3, 3));
        assert!(lattice.cell_at(1, 1).is_none());
        assert_eq!(lattice.cell_at(2, 2).map(|c| c.quad_index), Some(8));
    }
}
