// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Phase reconciliation, DP mode (`spec.md` §4.5): exact minimum-switch
//! shortest path over window-indexed candidate pair sets. Implemented as
//! a flat `Vec<Vec<_>>` backward table (not a graph-library dependency
//! — see the DP-mode entry in `DESIGN.md`), since each window's
//! candidate set is small and the DAG is strictly layered.

/// An unordered strand-pair candidate, as complete haplotype indices.
pub type Pair = (usize, usize);

/// `λ · min(parallel, crossover)²` between two candidate pairs, per
/// `spec.md` §4.5.
pub fn pair_error(p: Pair, q: Pair, lambda: f64) -> f64 {
    let parallel = (p.0 != q.0) as u8 + (p.1 != q.1) as u8;
    let crossover = (p.0 != q.1) as u8 + (p.1 != q.0) as u8;
    let switches = parallel.min(crossover) as f64;
    lambda * switches * switches
}

/// Result of the DP solve: the chosen candidate index per window, and
/// the total objective value achieved.
pub struct DpSolution {
    pub chosen: Vec<usize>,
    pub total_error: f64,
}

/// Solve `spec.md` §4.5's backward recursion over `candidates`, one
/// `Vec<Pair>` per window. Every window must have at least one
/// candidate. Ties in `bestErr`/`argmin` favor the smallest candidate
/// index, mirroring the pair-scan's own lexicographic tie-break rule.
pub fn solve(candidates: &[Vec<Pair>], lambda: f64) -> DpSolution {
    let w_count = candidates.len();
    assert!(w_count > 0, "DP reconciliation requires at least one window");
    assert!(
        candidates.iter().all(|s| !s.is_empty()),
        "every window must offer at least one candidate pair"
    );

    let mut best_err: Vec<Vec<f64>> = vec![Vec::new(); w_count];
    let mut next_pair: Vec<Vec<usize>> = vec![Vec::new(); w_count];

    let last = w_count - 1;
    best_err[last] = vec![0.0; candidates[last].len()];
    next_pair[last] = vec![0; candidates[last].len()];

    for w in (0..last).rev() {
        let this_set = &candidates[w];
        let next_set = &candidates[w + 1];
        let mut err_row = Vec::with_capacity(this_set.len());
        let mut arg_row = Vec::with_capacity(this_set.len());
        for &pi in this_set {
            let mut best_j = 0usize;
            let mut best_val = f64::INFINITY;
            for (j, &qj) in next_set.iter().enumerate() {
                let candidate_val = pair_error(pi, qj, lambda) + best_err[w + 1][j];
                if candidate_val < best_val {
                    best_val = candidate_val;
                    best_j = j;
                }
            }
            err_row.push(best_val);
            arg_row.push(best_j);
        }
        best_err[w] = err_row;
        next_pair[w] = arg_row;
    }

    let mut start_idx = 0usize;
    let mut start_val = f64::INFINITY;
    for (i, &val) in best_err[0].iter().enumerate() {
        if val < start_val {
            start_val = val;
            start_idx = i;
        }
    }

    let mut chosen = Vec::with_capacity(w_count);
    let mut cur = start_idx;
    chosen.push(cur);
    for w in 0..last {
        cur = next_pair[w][cur];
        chosen.push(cur);
    }

    DpSolution {
        chosen,
        total_error: start_val,
    }
}
