//! Dynamic time warping between two anchor time sequences.
//!
//! Classic cumulative-cost recurrence over a dense matrix, backtracked from
//! the final cell. The caller normalizes both sequences into one coordinate
//! frame first (removing each side's start offset, or applying a running
//! offset estimate). The warping path is monotone and contiguous in both
//! indices; degenerate runs (several cells sharing one row or column) are
//! resolved afterwards by keeping the cheapest cell per index.

use nalgebra::DMatrix;

/// Local cost between one behavioral anchor and one ephys anchor, both
/// already expressed in the same coordinate frame.
///
/// The cost function is a swappable strategy so the warping behavior can be
/// tuned without touching the recurrence.
pub trait LocalCost: Send + Sync {
    /// Cost of pairing the two normalized anchor times
    fn cost(&self, behavioral: f64, ephys: f64) -> f64;
}

/// Default cost: absolute time difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteDiff;

impl LocalCost for AbsoluteDiff {
    fn cost(&self, behavioral: f64, ephys: f64) -> f64 {
        (behavioral - ephys).abs()
    }
}

/// One behavioral/ephys anchor pair kept after degeneracy resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MatchedPair {
    /// Index into the behavioral anchor sequence
    pub behavioral: usize,
    /// Index into the ephys anchor sequence
    pub ephys: usize,
    /// Local cost of the kept cell
    pub local_cost: f64,
}

/// Result of one DTW run.
#[derive(Debug, Clone)]
pub(crate) struct DtwOutcome {
    /// Matched pairs, strictly increasing in both indices
    pub pairs: Vec<MatchedPair>,
    /// Mean local cost of the kept matched pairs.
    ///
    /// Degenerate cells discarded by the tie-break do not count, so a search
    /// window longer than the behavioral side cannot inflate the figure.
    pub mean_cost: f64,
}

/// Run DTW between two anchor time sequences.
///
/// Both slices must hold at least two elements; the caller enforces this
/// because an undersized side is a recoverable per-pair failure, not a
/// programming error here.
pub(crate) fn align_sequences(
    behavioral: &[f64],
    ephys: &[f64],
    cost_fn: &dyn LocalCost,
) -> DtwOutcome {
    let n = behavioral.len();
    let m = ephys.len();
    debug_assert!(n >= 2 && m >= 2);

    let local = |i: usize, j: usize| cost_fn.cost(behavioral[i], ephys[j]);

    // Cumulative cost matrix
    let mut cum = DMatrix::<f64>::zeros(n, m);
    cum[(0, 0)] = local(0, 0);
    for j in 1..m {
        cum[(0, j)] = cum[(0, j - 1)] + local(0, j);
    }
    for i in 1..n {
        cum[(i, 0)] = cum[(i - 1, 0)] + local(i, 0);
        for j in 1..m {
            let best = cum[(i - 1, j - 1)]
                .min(cum[(i - 1, j)])
                .min(cum[(i, j - 1)]);
            cum[(i, j)] = best + local(i, j);
        }
    }

    // Backtrack from the final cell; prefer the diagonal on ties so the path
    // is deterministic
    let mut path = vec![(n - 1, m - 1)];
    let (mut i, mut j) = (n - 1, m - 1);
    while i > 0 || j > 0 {
        let step = if i == 0 {
            (i, j - 1)
        } else if j == 0 {
            (i - 1, j)
        } else {
            let diag = cum[(i - 1, j - 1)];
            let up = cum[(i - 1, j)];
            let left = cum[(i, j - 1)];
            if diag <= up && diag <= left {
                (i - 1, j - 1)
            } else if up <= left {
                (i - 1, j)
            } else {
                (i, j - 1)
            }
        };
        path.push(step);
        (i, j) = step;
    }
    path.reverse();

    let pairs = resolve_degenerate(&path, &local);
    let mean_cost = pairs.iter().map(|p| p.local_cost).sum::<f64>() / pairs.len() as f64;

    DtwOutcome { pairs, mean_cost }
}

/// Collapse degenerate path runs into one pair per index.
///
/// Pass 1 keeps, for every behavioral index, the cheapest cell of its run.
/// Pass 2 re-resolves ephys indices claimed by several behavioral anchors the
/// same way; losing behavioral anchors become unmatched. Exact cost ties keep
/// the earliest index, which makes the user-visible match deterministic.
fn resolve_degenerate(path: &[(usize, usize)], local: &dyn Fn(usize, usize) -> f64) -> Vec<MatchedPair> {
    let mut per_behavioral: Vec<MatchedPair> = Vec::new();
    for &(i, j) in path {
        let cell = MatchedPair {
            behavioral: i,
            ephys: j,
            local_cost: local(i, j),
        };
        match per_behavioral.last_mut() {
            Some(last) if last.behavioral == i => {
                if cell.local_cost < last.local_cost {
                    *last = cell;
                }
            }
            _ => per_behavioral.push(cell),
        }
    }

    let mut pairs: Vec<MatchedPair> = Vec::new();
    for pick in per_behavioral {
        match pairs.last_mut() {
            Some(last) if last.ephys == pick.ephys => {
                if pick.local_cost < last.local_cost {
                    *last = pick;
                }
            }
            _ => pairs.push(pick),
        }
    }

    debug_assert!(pairs
        .windows(2)
        .all(|w| w[0].behavioral < w[1].behavioral && w[0].ephys < w[1].ephys));
    pairs
}
