//! Douglas–Peucker simplification of closed pixel contours.

use nalgebra::Point2;

fn point_line_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len = ab.norm();
    if len <= f32::EPSILON {
        return (p - a).norm();
    }
    (ab.x * (p.y - a.y) - ab.y * (p.x - a.x)).abs() / len
}

/// Closed polygon perimeter.
pub fn perimeter(pts: &[Point2<f32>]) -> f32 {
    if pts.len() < 2 {
        return 0.0;
    }
    (0..pts.len())
        .map(|i| (pts[(i + 1) % pts.len()] - pts[i]).norm())
        .sum()
}

// Keep-flags for the open chain `idx` (indices into `pts`), endpoints kept.
fn simplify_chain(pts: &[Point2<f32>], idx: &[usize], epsilon: f32, keep: &mut [bool]) {
    if idx.len() < 2 {
        return;
    }
    keep[idx[0]] = true;
    keep[idx[idx.len() - 1]] = true;

    let mut stack = vec![(0usize, idx.len() - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let a = pts[idx[lo]];
        let b = pts[idx[hi]];
        let mut best = (lo, 0.0f32);
        for k in (lo + 1)..hi {
            let d = point_line_distance(pts[idx[k]], a, b);
            if d > best.1 {
                best = (k, d);
            }
        }
        if best.1 > epsilon {
            keep[idx[best.0]] = true;
            stack.push((lo, best.0));
            stack.push((best.0, hi));
        }
    }
}

/// Simplify a closed contour with tolerance `epsilon` (pixels).
///
/// The ring is split at two far-apart anchors (the point farthest from the
/// first one, and the point farthest from that) and each half is simplified
/// as an open chain. Vertices come back in contour order.
pub fn simplify_closed(pts: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    let n = pts.len();
    if n < 3 {
        return pts.to_vec();
    }

    let farthest_from = |from: usize| {
        let mut best = (from, 0.0f32);
        for (i, p) in pts.iter().enumerate() {
            let d = (p - pts[from]).norm_squared();
            if d > best.1 {
                best = (i, d);
            }
        }
        best.0
    };
    let a = farthest_from(0);
    let b = farthest_from(a);
    if a == b {
        return vec![pts[a]];
    }

    let chain = |from: usize, to: usize| -> Vec<usize> {
        let len = (to + n - from) % n;
        (0..=len).map(|k| (from + k) % n).collect()
    };

    let mut keep = vec![false; n];
    simplify_chain(pts, &chain(a, b), epsilon, &mut keep);
    simplify_chain(pts, &chain(b, a), epsilon, &mut keep);

    (0..n).filter(|&i| keep[i]).map(|i| pts[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour(x0: f32, y0: f32, side: usize) -> Vec<Point2<f32>> {
        let s = side as f32;
        let mut pts = Vec::new();
        for i in 0..side {
            pts.push(Point2::new(x0 + i as f32, y0));
        }
        for i in 0..side {
            pts.push(Point2::new(x0 + s, y0 + i as f32));
        }
        for i in 0..side {
            pts.push(Point2::new(x0 + s - i as f32, y0 + s));
        }
        for i in 0..side {
            pts.push(Point2::new(x0, y0 + s - i as f32));
        }
        pts
    }

    #[test]
    fn square_reduces_to_its_corners() {
        let pts = square_contour(10.0, 20.0, 30);
        let eps = 0.04 * perimeter(&pts);
        let poly = simplify_closed(&pts, eps);
        assert_eq!(poly.len(), 4);
        for corner in [
            Point2::new(10.0, 20.0),
            Point2::new(40.0, 20.0),
            Point2::new(40.0, 50.0),
            Point2::new(10.0, 50.0),
        ] {
            assert!(poly.contains(&corner), "missing {corner:?} in {poly:?}");
        }
    }

    #[test]
    fn small_wiggles_are_removed_but_large_notches_kept() {
        let mut pts = square_contour(0.0, 0.0, 40);
        // one-pixel bump on the top edge
        pts[10].y -= 1.0;
        let eps = 0.02 * perimeter(&pts);
        assert_eq!(simplify_closed(&pts, eps).len(), 4);

        // a deep notch survives
        pts[20].y += 15.0;
        assert!(simplify_closed(&pts, eps).len() > 4);
    }

    #[test]
    fn degenerate_inputs() {
        let single = vec![Point2::new(1.0, 1.0); 5];
        assert_eq!(simplify_closed(&single, 1.0).len(), 1);
        assert!(simplify_closed(&[], 1.0).is_empty());
    }
}
