// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Haplotype-thinning prescreen (`spec.md` §4.1): pick the top-`tf`
//! columns most aligned with a sample's genotype vector, assemble a small
//! `tf × tf` restriction of `M`, and solve the pair search on that
//! reduced panel only.

use ndarray::{Array2, ArrayView1, ArrayView2};
use ordered_float::NotNan;

use super::exhaustive::scan_full;
use super::scratch::PairResult;

/// Rank columns by `N[j,a]` centered by its row mean, and keep the
/// top-`tf` indices in ascending column order. Ties broken by smallest
/// column index, per `spec.md` §9's open-question resolution. Ranking
/// keys are `NotNan` so the sort is a total order without a
/// `partial_cmp().unwrap()` that would panic on a NaN criterion value.
pub fn select_top_tf(n_row: &ArrayView1<f64>, tf: usize) -> Vec<usize> {
    let d = n_row.len();
    let tf = tf.min(d);
    let mean = n_row.sum() / d as f64;
    let mut ranked: Vec<(usize, NotNan<f64>)> = (0..d)
        .map(|a| (a, NotNan::new(n_row[a] - mean).expect("centered criterion must be finite")))
        .collect();
    ranked.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(&y.0)));
    let mut chosen: Vec<usize> = ranked.into_iter().take(tf).map(|(a, _)| a).collect();
    chosen.sort_unstable();
    chosen
}

/// Build the restricted `tf x tf` `M_k` and `N_k` for one sample from
/// the full `m`/`n_row`, then run a full exhaustive scan on that small
/// panel, translating results back to original column indices.
pub fn scan_thinned(
    m: ArrayView2<f64>,
    n_row: ArrayView1<f64>,
    sq_norm: f64,
    tf: usize,
) -> PairResult {
    let chosen = select_top_tf(&n_row, tf);
    let k = chosen.len();
    let mut m_k = Array2::<f64>::zeros((k, k));
    let mut n_k = Vec::with_capacity(k);
    for (ki, &ci) in chosen.iter().enumerate() {
        n_k.push(n_row[ci]);
        for (kj, &cj) in chosen.iter().enumerate() {
            m_k[[ki, kj]] = m[[ci, cj]];
        }
    }
    let n_k_arr = ndarray::Array1::from(n_k);
    let local = scan_full(m_k.view(), n_k_arr.view(), sq_norm);
    PairResult {
        a: chosen[local.a],
        b: chosen[local.b],
        hapscore: local.hapscore,
    }
}

pub fn scan_all_thinned(m: ArrayView2<f64>, n: ArrayView2<f64>, sq_norms: &[f64], tf: usize) -> Vec<PairResult> {
    (0..n.nrows())
        .map(|j| scan_thinned(m, n.row(j), sq_norms[j], tf))
        .collect()
}
