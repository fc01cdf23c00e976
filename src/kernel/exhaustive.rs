// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The exhaustive pair scan (`spec.md` §4.1): for each sample, scan the
//! upper triangle `a ≤ b` of the precomputed `M`/`N` matrices and keep the
//! minimizer, with ties resolved lexicographically by iterating
//! `for b in 0..d, for a in 0..=b`.

use ndarray::{ArrayView1, ArrayView2};

use super::scratch::PairResult;

/// Scan the full `a ≤ b` triangle for one sample's column `n[j, ..]`,
/// given the shared `m`. `sq_norm` is `||x_j||^2`, added to the returned
/// score per `spec.md` §4.1 so callers see the true residual.
pub fn scan_full(m: ArrayView2<f64>, n_row: ArrayView1<f64>, sq_norm: f64) -> PairResult {
    let d = m.nrows();
    let mut best = PairResult {
        a: 0,
        b: 0,
        hapscore: f64::INFINITY,
    };
    for b in 0..d {
        for a in 0..=b {
            let score = m[[a, b]] - n_row[a] - n_row[b];
            if score < best.hapscore {
                best = PairResult { a, b, hapscore: score };
            }
        }
    }
    best.hapscore += sq_norm;
    best
}

/// Scan every sample column of `n` against `m`, returning one
/// `PairResult` per sample in sample order.
pub fn scan_all(m: ArrayView2<f64>, n: ArrayView2<f64>, sq_norms: &[f64]) -> Vec<PairResult> {
    (0..n.nrows())
        .map(|j| scan_full(m, n.row(j), sq_norms[j]))
        .collect()
}

/// Restricted scan where `a` is limited to `allowed_a` (used by lasso
/// prescreen) but `b` still ranges over the whole panel; the pair is
/// normalized to `a <= b` after the scan since the restriction may pick
/// `a > b` from the candidate set's perspective.
pub fn scan_restricted_a(
    m: ArrayView2<f64>,
    n_row: ArrayView1<f64>,
    sq_norm: f64,
    allowed_a: &[usize],
) -> PairResult {
    let d = m.nrows();
    let mut best = PairResult {
        a: 0,
        b: 0,
        hapscore: f64::INFINITY,
    };
    for &a in allowed_a {
        for b in 0..d {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let score = m[[lo, hi]] - n_row[lo] - n_row[hi];
            if score < best.hapscore {
                best = PairResult { a: lo, b: hi, hapscore: score };
            }
        }
    }
    best.hapscore += sq_norm;
    best
}
