// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Objective assembly for the pair-search kernel (`spec.md` §4.1): missing
//! pre-imputation, optional allele-frequency scaling, and the `M`/`N`
//! matrices whose entries let the pair scan evaluate
//! `‖x_j − u_a − u_b‖²` without ever materializing `u_a + u_b`.

use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut2, Axis};

use crate::errors::{Error, Result};

/// Floor below which a row's minor-allele frequency is clamped for
/// inverse-variance scaling, per `spec.md` §4.1.
const SCALE_FREQ_FLOOR: f64 = 0.15;
/// Scaling weight applied to rows below the floor.
const SCALE_FREQ_FLOOR_WEIGHT: f64 = 1.98;

/// Replace missing entries (`None`) in `xw` with `2·q_i`, the empirical
/// allele frequency of row `i` over that window's non-missing entries (0
/// if the row is entirely missing). Returns a dense float matrix. `window`
/// is the absolute window index, reported in `NonFiniteWorkingMatrix`
/// per `spec.md` §7's per-window fatal-error contract.
pub fn pre_impute(window: usize, xw: &Array2<Option<f64>>) -> Result<Array2<f64>> {
    let (p, n) = xw.dim();
    let mut out = Array2::<f64>::zeros((p, n));
    for i in 0..p {
        let row = xw.row(i);
        let (sum, count) = row.iter().fold((0.0, 0usize), |(sum, count), entry| match entry {
            Some(v) => (sum + v, count + 1),
            None => (sum, count),
        });
        let q_i = if count == 0 { 0.0 } else { sum / (2.0 * count as f64) };
        for j in 0..n {
            out[[i, j]] = row[j].unwrap_or(2.0 * q_i);
        }
    }
    if out.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFiniteWorkingMatrix { window });
    }
    Ok(out)
}

/// Per-row inverse-variance scaling weight, floored per `spec.md` §4.1.
pub fn scale_weight(p_i: f64) -> f64 {
    let maf = p_i.min(1.0 - p_i);
    if maf < SCALE_FREQ_FLOOR {
        SCALE_FREQ_FLOOR_WEIGHT
    } else {
        1.0 / (2.0 * p_i * (1.0 - p_i)).sqrt()
    }
}

/// Apply allele-frequency scaling in place, row by row, to both `u` and
/// `x` so `M`/`N` assembly sees consistently scaled inputs.
pub fn apply_scaling(u: &mut Array2<f64>, x: &mut Array2<f64>, altfreq: &[f64]) {
    for (i, &p_i) in altfreq.iter().enumerate() {
        let w_i = scale_weight(p_i);
        u.row_mut(i).mapv_inplace(|v| v * w_i);
        x.row_mut(i).mapv_inplace(|v| v * w_i);
    }
}

/// `u_a^T u_b` for every pair of columns, shared by `build_m` and the
/// lasso prescreen's stepwise selection criterion.
pub fn build_gram(u: &ArrayView2<f64>) -> Array2<f64> {
    u.t().dot(u)
}

/// `M[a,b] = ||u_a||^2 + ||u_b||^2 + 2 u_a^T u_b`, written into `out`
/// (already sized `d x d`) from a precomputed Gram matrix — the scratch
/// variant of `build_m`, used by the kernel so the hot loop writes into
/// the per-thread `Scratch::m` buffer instead of allocating.
pub fn build_m_into(gram: &Array2<f64>, out: &mut ArrayViewMut2<f64>) {
    let d = gram.nrows();
    let diag: Array1<f64> = (0..d).map(|a| gram[[a, a]]).collect();
    for a in 0..d {
        for b in 0..d {
            out[[a, b]] = diag[a] + diag[b] + 2.0 * gram[[a, b]];
        }
    }
}

/// `M[a,b] = ||u_a||^2 + ||u_b||^2 + 2 u_a^T u_b`, assembled via `U^T U`
/// plus outer symmetrization of the diagonal.
pub fn build_m(u: &ArrayView2<f64>) -> Array2<f64> {
    let gram = build_gram(u);
    let d = gram.nrows();
    let mut m = Array2::<f64>::zeros((d, d));
    build_m_into(&gram, &mut m.view_mut());
    m
}

/// `N[j,a] = 2 x_j^T u_a`, written into `out` (already sized
/// `n_samples x d`) — the scratch variant of `build_n`.
pub fn build_n_into(x: &ArrayView2<f64>, u: &ArrayView2<f64>, out: &mut ArrayViewMut2<f64>) {
    let n = x.t().dot(u);
    out.assign(&n);
    out.mapv_inplace(|v| v * 2.0);
}

/// `N[j,a] = 2 x_j^T u_a`, assembled via `X^T U`.
pub fn build_n(x: &ArrayView2<f64>, u: &ArrayView2<f64>) -> Array2<f64> {
    let mut n = x.t().dot(u);
    n *= 2.0;
    n
}

/// `||x_j||^2` for every sample, needed to finalize `hapscore`.
pub fn squared_norms(x: &ArrayView2<f64>) -> Array1<f64> {
    x.axis_iter(Axis(1)).map(|col| col.dot(&col)).collect()
}
