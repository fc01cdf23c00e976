// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Lasso-style stepwise prescreen (`spec.md` §4.1): for each sample, pick
//! the top-`r` unique columns by a forward stepwise gradient criterion,
//! then restrict the exhaustive scan's `a` to that set.

use ndarray::{ArrayView1, ArrayView2};

use super::exhaustive::scan_restricted_a;
use super::scratch::PairResult;

/// Forward-stepwise column selection: repeatedly pick the column `a` not
/// yet chosen maximizing `|N[j,a] − partial_fit[a]|`, where `partial_fit`
/// accumulates the projection of already-chosen columns onto `a` via the
/// Gram matrix (`gram[a,c] = u_a^T u_c`). Ties broken by smallest column
/// index, per `spec.md` §9's open-question resolution.
pub fn select_top_r(
    gram: &ArrayView2<f64>,
    n_row: &ArrayView1<f64>,
    r: usize,
) -> Vec<usize> {
    let d = gram.nrows();
    let r = r.min(d);
    let mut partial_fit = vec![0.0f64; d];
    let mut chosen = Vec::with_capacity(r);
    let mut available: Vec<bool> = vec![true; d];

    for _ in 0..r {
        let mut best_idx = None;
        let mut best_val = f64::NEG_INFINITY;
        for a in 0..d {
            if !available[a] {
                continue;
            }
            let criterion = (n_row[a] - partial_fit[a]).abs();
            if criterion > best_val {
                best_val = criterion;
                best_idx = Some(a);
            }
        }
        let picked = match best_idx {
            Some(idx) => idx,
            None => break,
        };
        available[picked] = false;
        chosen.push(picked);
        for a in 0..d {
            partial_fit[a] += 2.0 * gram[[a, picked]];
        }
    }
    chosen.sort_unstable();
    chosen
}

/// Run the lasso-prescreen variant for every sample: select each
/// sample's top-`r` columns, then exhaustively pair-scan with `a`
/// restricted to that set and `b` ranging over the full panel.
pub fn scan_all_lasso(
    m: ArrayView2<f64>,
    n: ArrayView2<f64>,
    gram: &Array2<f64>,
    sq_norms: &[f64],
    r: usize,
) -> Vec<PairResult> {
    (0..n.nrows())
        .map(|j| {
            let n_row = n.row(j);
            let allowed_a = select_top_r(&gram.view(), &n_row, r);
            let mut result = scan_restricted_a(m, n_row, sq_norms[j], &allowed_a);
            result.hapscore = result.hapscore.max(0.0);
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::objective::{build_gram, build_m, build_n, squared_norms};
    use ndarray::array;

    #[test]
    fn top_r_prefers_columns_best_aligned_with_sample() {
        let u = array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];
        let x = array![[1.0], [0.0]];
        let gram = build_gram(&u.view());
        let n = build_n(&x.view(), &u.view());
        let chosen = select_top_r(&gram.view(), &n.row(0), 2);
        assert_eq!(chosen.len(), 2);
        assert!(chosen.contains(&0));
        assert!(chosen.contains(&2));
    }

    #[test]
    fn restricted_scan_still_recovers_exact_pair_when_r_covers_it() {
        let u = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let x = array![[1.0], [1.0], [0.0]];
        let m = build_m(&u.view());
        let n = build_n(&x.view(), &u.view());
        let gram = build_gram(&u.view());
        let sq = squared_norms(&x.view());
        let results = scan_all_lasso(m.view(), n.view(), &gram, sq.as_slice().unwrap(), 2);
        assert!(results[0].hapscore.abs() < 1e-9);
    }
}
