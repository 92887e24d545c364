//! Moore-neighbour tracing of a component's outer boundary.

use super::regions::{Component, Regions};

/// 8-neighbourhood in clockwise screen order (y down), starting east.
const DIRS: [[isize; 2]; 8] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
];

const WEST: usize = 4;

#[inline]
fn dir_index(dx: isize, dy: isize) -> usize {
    DIRS.iter()
        .position(|d| d[0] == dx && d[1] == dy)
        .unwrap_or(WEST)
}

/// Trace the outer boundary of `comp`, clockwise on screen.
///
/// Starts at the component's first raster pixel with the backtrack on its
/// west side. Stops on re-entering the start from that same side (Jacob's
/// criterion), when leaving the start again towards the second contour
/// point, after the start has been visited three times, or after `max_steps`
/// moves. Returned points do not repeat the start.
pub fn trace_boundary(regions: &Regions, comp: &Component, max_steps: usize) -> Vec<[isize; 2]> {
    let label = comp.label;
    let p0 = [comp.start[0] as isize, comp.start[1] as isize];
    let inside = |p: [isize; 2]| regions.label_at(p[0], p[1]) == label;

    let mut contour = vec![p0];
    let mut p = p0;
    // Direction from `p` to its backtrack pixel.
    let mut back = WEST;
    let start_back = WEST;
    let mut start_visits = 1usize;

    for step in 0..max_steps {
        let mut next = None;
        for k in 1..=8 {
            let d = (back + k) % 8;
            let q = [p[0] + DIRS[d][0], p[1] + DIRS[d][1]];
            if inside(q) {
                next = Some((q, (back + k - 1) % 8));
                break;
            }
        }
        let Some((q, prev_dir)) = next else {
            // Isolated pixel.
            break;
        };

        if step > 0 && p == p0 && contour.get(1) == Some(&q) {
            if contour.len() > 1 && contour.last() == Some(&p0) {
                contour.pop();
            }
            break;
        }

        // New backtrack: the last outside pixel examined, seen from `q`.
        let b = [p[0] + DIRS[prev_dir][0], p[1] + DIRS[prev_dir][1]];
        back = dir_index(b[0] - q[0], b[1] - q[1]);
        p = q;

        if p == p0 {
            start_visits += 1;
            if back == start_back || start_visits >= 3 {
                break;
            }
        }
        contour.push(p);
    }

    contour
}
