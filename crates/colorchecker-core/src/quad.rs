//! Convex quadrilaterals in image space.
//!
//! Coordinates follow the image convention used across the workspace:
//! `x` to the right, `y` down, pixel centers at integer coordinates.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Convex quadrilateral with normalized corner order.
///
/// Corners are stored clockwise on screen (positive shoelace area with `y`
/// pointing down) starting from the corner with the smallest `x + y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    corners: [Point2<f32>; 4],
}

#[inline]
fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

// Extent of `pts` along `axis`.
fn project(pts: &[Point2<f32>; 4], axis: Vector2<f32>) -> (f32, f32) {
    pts.iter()
        .map(|p| p.coords.dot(&axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

fn signed_area(pts: &[Point2<f32>; 4]) -> f32 {
    let mut acc = 0.0f32;
    for i in 0..4 {
        let p = pts[i];
        let q = pts[(i + 1) % 4];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

impl Quad {
    /// Build a quad from four corners in either winding.
    ///
    /// Returns `None` for non-finite, degenerate, self-intersecting or
    /// non-convex input.
    pub fn new(corners: [Point2<f32>; 4]) -> Option<Self> {
        if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return None;
        }

        let mut pts = corners;
        if signed_area(&pts) < 0.0 {
            pts.reverse();
        }
        if signed_area(&pts) <= f32::EPSILON {
            return None;
        }

        // Strict convexity: every turn has the same (positive) sign. With the
        // winding fixed above this also rules out bow-tie shapes.
        for i in 0..4 {
            if cross(pts[i], pts[(i + 1) % 4], pts[(i + 2) % 4]) <= 0.0 {
                return None;
            }
        }

        let start = (0..4)
            .min_by(|&a, &b| {
                let ka = pts[a].x + pts[a].y;
                let kb = pts[b].x + pts[b].y;
                ka.total_cmp(&kb)
                    .then_with(|| pts[a].y.total_cmp(&pts[b].y))
            })
            .unwrap_or(0);
        pts.rotate_left(start);

        Some(Self { corners: pts })
    }

    /// Axis-aligned rectangle from its top-left corner and size.
    pub fn from_rect(x: f32, y: f32, w: f32, h: f32) -> Option<Self> {
        Self::new([
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ])
    }

    #[inline]
    pub fn corners(&self) -> &[Point2<f32>; 4] {
        &self.corners
    }

    /// Polygon area in square pixels.
    pub fn area(&self) -> f32 {
        signed_area(&self.corners)
    }

    /// Mean of the four corners.
    pub fn center(&self) -> Point2<f32> {
        let mut c = Vector2::zeros();
        for p in &self.corners {
            c += p.coords;
        }
        Point2::from(c / 4.0)
    }

    /// Side lengths, starting with the edge leaving the first corner.
    pub fn side_lengths(&self) -> [f32; 4] {
        let c = &self.corners;
        [
            (c[1] - c[0]).norm(),
            (c[2] - c[1]).norm(),
            (c[3] - c[2]).norm(),
            (c[0] - c[3]).norm(),
        ]
    }

    /// Ratio of the longer to the shorter mean of opposite sides (≥ 1).
    pub fn aspect(&self) -> f32 {
        let s = self.side_lengths();
        let a = 0.5 * (s[0] + s[2]);
        let b = 0.5 * (s[1] + s[3]);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if lo <= f32::EPSILON {
            f32::INFINITY
        } else {
            hi / lo
        }
    }

    /// Square root of the area; a size measure robust to shape.
    #[inline]
    pub fn side(&self) -> f32 {
        self.area().max(0.0).sqrt()
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        (0..4).all(|i| cross(self.corners[i], self.corners[(i + 1) % 4], p) >= 0.0)
    }

    /// Move every corner toward the center by `frac` of its distance.
    ///
    /// Returns `None` when the result degenerates (`frac >= 1`).
    pub fn shrink(&self, frac: f32) -> Option<Self> {
        let c = self.center();
        let k = 1.0 - frac;
        let corners = self.corners.map(|p| c + (p - c) * k);
        Self::new(corners)
    }

    /// Integer pixel bounds `(x0, y0, x1, y1)` (inclusive) clipped to an image.
    pub fn pixel_bounds(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        if width == 0 || height == 0 {
            return None;
        }
        let mut min = Point2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &self.corners {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let x0 = min.x.ceil().max(0.0);
        let y0 = min.y.ceil().max(0.0);
        let x1 = max.x.floor().min((width - 1) as f32);
        let y1 = max.y.floor().min((height - 1) as f32);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Whether the interiors of two quads intersect.
    ///
    /// Separating-axis test over the edge normals of both quads; quads that
    /// only share an edge or a corner do not overlap.
    pub fn overlaps(&self, other: &Quad) -> bool {
        const EPS: f32 = 1e-3;
        let separated_by = |edges: &Quad| {
            (0..4).any(|i| {
                let a = edges.corners[i];
                let b = edges.corners[(i + 1) % 4];
                let n = Vector2::new(a.y - b.y, b.x - a.x);
                let (lo0, hi0) = project(&self.corners, n);
                let (lo1, hi1) = project(&other.corners, n);
                hi0 <= lo1 + EPS * n.norm() || hi1 <= lo0 + EPS * n.norm()
            })
        };
        !(separated_by(self) || separated_by(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn winding_and_start_corner_are_normalized() {
        // Counter-clockwise on screen, starting at the bottom-right corner.
        let q = Quad::new([
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
        ])
        .expect("quad");
        assert_eq!(q.corners()[0], Point2::new(0.0, 0.0));
        assert_eq!(q.corners()[1], Point2::new(10.0, 0.0));
        assert_eq!(q.corners()[2], Point2::new(10.0, 10.0));
        assert_abs_diff_eq!(q.area(), 100.0);
    }

    #[test]
    fn rejects_bow_tie_and_concave() {
        let bow_tie = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(Quad::new(bow_tie).is_none());

        let concave = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(3.0, 3.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(Quad::new(concave).is_none());

        let collinear = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(Quad::new(collinear).is_none());
    }

    #[test]
    fn shrink_keeps_center_and_scales_area() {
        let q = Quad::from_rect(0.0, 0.0, 20.0, 10.0).expect("rect");
        let s = q.shrink(0.5).expect("shrunk");
        assert_abs_diff_eq!(s.center().x, 10.0);
        assert_abs_diff_eq!(s.center().y, 5.0);
        assert_abs_diff_eq!(s.area(), 50.0, epsilon = 1e-4);
        assert!(q.shrink(1.0).is_none());
    }

    #[test]
    fn contains_and_bounds() {
        let q = Quad::from_rect(2.0, 3.0, 4.0, 4.0).expect("rect");
        assert!(q.contains(Point2::new(4.0, 5.0)));
        assert!(q.contains(Point2::new(2.0, 3.0)));
        assert!(!q.contains(Point2::new(1.9, 5.0)));
        assert_eq!(q.pixel_bounds(100, 100), Some((2, 3, 6, 7)));
        assert_eq!(q.pixel_bounds(5, 5), Some((2, 3, 4, 4)));
        assert_abs_diff_eq!(q.aspect(), 1.0);
    }

    #[test]
    fn overlap_ignores_shared_edges() {
        let a = Quad::from_rect(0.0, 0.0, 10.0, 10.0).expect("rect");
        let touching = Quad::from_rect(10.0, 0.0, 10.0, 10.0).expect("rect");
        let apart = Quad::from_rect(12.0, 3.0, 5.0, 5.0).expect("rect");
        let inside = Quad::from_rect(9.0, 9.0, 4.0, 4.0).expect("rect");
        assert!(!a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
        assert!(a.overlaps(&inside) && inside.overlaps(&a));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn overlap_of_rotated_squares() {
        // Diamond centered on the corner (10, 10) of an axis-aligned square.
        let square = Quad::from_rect(0.0, 0.0, 10.0, 10.0).expect("rect");
        let diamond = |cx: f32, cy: f32| {
            Quad::new([
                Point2::new(cx, cy - 3.0),
                Point2::new(cx + 3.0, cy),
                Point2::new(cx, cy + 3.0),
                Point2::new(cx - 3.0, cy),
            ])
            .expect("diamond")
        };
        assert!(square.overlaps(&diamond(10.0, 10.0)));
        // Bounding boxes intersect, shapes do not.
        assert!(!square.overlaps(&diamond(12.0, 12.0)));
    }
}
