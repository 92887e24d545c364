//! Choice of the single best candidate.

use super::{NotFound, NotFoundReason};
use crate::grid::CandidateGrid;
use crate::matcher::MatchOutcome;
use crate::sample::PatchSample;
use colorchecker_core::{Orientation, ALL_ORIENTATIONS};
use std::cmp::Ordering;

/// A grid with its sampled colors and best orientation.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub grid: CandidateGrid,
    pub samples: Vec<PatchSample>,
    pub outcome: MatchOutcome,
}

fn orientation_rank(o: Orientation) -> usize {
    ALL_ORIENTATIONS
        .iter()
        .position(|x| *x == o)
        .unwrap_or(ALL_ORIENTATIONS.len())
}

/// Total order over candidates; the best compares as `Less`.
///
/// Higher score first, then lower total residual, more matched quads, lower
/// topology index, lower cluster index and earlier orientation.
pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.outcome
        .score
        .total_cmp(&a.outcome.score)
        .then(a.grid.total_residual.total_cmp(&b.grid.total_residual))
        .then(b.grid.matched.cmp(&a.grid.matched))
        .then(a.grid.topology_index.cmp(&b.grid.topology_index))
        .then(a.grid.cluster_index.cmp(&b.grid.cluster_index))
        .then(orientation_rank(a.outcome.orientation).cmp(&orientation_rank(b.outcome.orientation)))
}

/// Index of the winning candidate, or why there is none.
///
/// An empty candidate list reports `NoQuadrilaterals` whether or not the
/// contour stage produced any quads; see [`super::DetectionDiagnostics`] to
/// tell the two apart.
pub fn select(candidates: &[ScoredCandidate], min_match_score: f32) -> Result<usize, NotFound> {
    let best = candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| compare(a, b))
        .map(|(i, _)| i)
        .ok_or(NotFound {
            reason: NotFoundReason::NoQuadrilaterals,
            best_score: None,
        })?;

    let score = candidates[best].outcome.score;
    if score < min_match_score {
        return Err(NotFound {
            reason: NotFoundReason::BelowThreshold,
            best_score: Some(score),
        });
    }
    Ok(best)
}
