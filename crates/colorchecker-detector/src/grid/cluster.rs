//! Grouping of quads into patch-sized, mutually adjacent clusters.

use colorchecker_core::Quad;
use kiddo::{KdTree, SquaredEuclidean};

/// Link neighbouring quads of similar size and return the connected
/// components with at least `min_size` members.
///
/// Members are sorted ascending; clusters are ordered by their first member.
pub fn cluster_quads(
    quads: &[Quad],
    k_neighbors: usize,
    max_link_ratio: f32,
    size_tolerance: f32,
    min_size: usize,
) -> Vec<Vec<usize>> {
    if quads.is_empty() {
        return Vec::new();
    }

    let centers: Vec<[f32; 2]> = quads
        .iter()
        .map(|q| {
            let c = q.center();
            [c.x, c.y]
        })
        .collect();
    let sides: Vec<f32> = quads.iter().map(Quad::side).collect();

    let tree: KdTree<f32, 2> = (&centers).into();
    let mut links: Vec<Vec<usize>> = vec![Vec::new(); quads.len()];

    for (i, query) in centers.iter().enumerate() {
        let results = tree.nearest_n::<SquaredEuclidean>(query, k_neighbors + 1);
        for nn in results.into_iter() {
            let j = nn.item as usize;
            if j == i {
                continue;
            }
            let big = sides[i].max(sides[j]);
            let dist = nn.distance.sqrt();
            if dist > max_link_ratio * big {
                continue;
            }
            if (sides[i] - sides[j]).abs() > size_tolerance * big {
                continue;
            }
            links[i].push(j);
            links[j].push(i);
        }
    }

    let mut visited = vec![false; quads.len()];
    let mut clusters = Vec::new();
    for start in 0..quads.len() {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            component.push(node);
            for &next in &links[node] {
                if !visited[next] {
                    stack.push(next);
                }
            }
        }
        if component.len() >= min_size {
            component.sort_unstable();
            clusters.push(component);
        }
    }
    clusters
}
