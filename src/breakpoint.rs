// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Breakpoint search (`spec.md` §4.6): on a `2·width` contiguous stretch,
//! locate the single- or double-strand crossover position minimizing
//! observed-entry squared residual.

use ndarray::Array2;

/// Sentinel returned when no split strictly improves over "no switch".
pub const NO_BREAK: isize = -1;

/// Result of a single-strand breakpoint search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breakpoint {
    pub bkpt: isize,
    pub err: f64,
}

/// `xi`: `2*width x 1` genotype slice (may contain missing). `hi`:
/// `2*width x D` haplotype slice. `fixed_label`: the non-switching
/// strand's haplotype. `cur`/`next`: the switching strand's label before
/// and after the candidate breakpoint.
///
/// `bkpt` is the 0-indexed last row assigned to `cur`: rows `0..=bkpt`
/// use `cur`, rows `bkpt+1..` use `next`. Ties go to the smallest
/// `bkpt`. Returns `(NO_BREAK, err_full)` when no split strictly
/// improves over keeping `cur` for the whole stretch.
pub fn search_single(
    xi: &Array2<Option<f64>>,
    hi: &Array2<f64>,
    fixed_label: usize,
    cur: usize,
    next: usize,
) -> Breakpoint {
    let len = xi.nrows();

    let residual_at = |i: usize, label: usize| -> Option<f64> {
        xi[[i, 0]].map(|x| {
            let fit = hi[[i, fixed_label]] + hi[[i, label]];
            let d = x - fit;
            d * d
        })
    };

    // err_full: no-switch baseline, `cur` for the entire stretch.
    let err_full: f64 = (0..len).filter_map(|i| residual_at(i, cur)).sum();

    // prefix_cur[k] = residual of rows [0, k) under `cur`.
    let mut prefix_cur = vec![0.0f64; len + 1];
    for i in 0..len {
        prefix_cur[i + 1] = prefix_cur[i] + residual_at(i, cur).unwrap_or(0.0);
    }
    // suffix_next[k] = residual of rows [k, len) under `next`.
    let mut suffix_next = vec![0.0f64; len + 1];
    for i in (0..len).rev() {
        suffix_next[i] = suffix_next[i + 1] + residual_at(i, next).unwrap_or(0.0);
    }

    let mut best_bkpt: isize = NO_BREAK;
    let mut best_err = err_full;
    // rows [0, bkpt] use cur (bkpt+1 rows), rows [bkpt+1, len) use next.
    for bkpt in 0..len {
        let err = prefix_cur[bkpt + 1] + suffix_next[bkpt + 1];
        if err < best_err {
            best_err = err;
            best_bkpt = bkpt as isize;
        }
    }

    Breakpoint {
        bkpt: best_bkpt,
        err: best_err,
    }
}

/// Joint search over two independent switching strands (`spec.md` §4.6
/// "double-switch variant"): `cur`/`next` pairs for strand 1 and 2 each,
/// minimizing the sum of both strands' residuals. The two strands'
/// fits are independent given the other strand's fixed label at each
/// row, so the joint optimum decomposes into two independent
/// single-strand searches; this function runs both and returns them
/// paired.
pub fn search_double(
    xi: &Array2<Option<f64>>,
    hi: &Array2<f64>,
    strand1_fixed: usize,
    strand1_cur: usize,
    strand1_next: usize,
    strand2_fixed: usize,
    strand2_cur: usize,
    strand2_next: usize,
) -> (Breakpoint, Breakpoint) {
    let bp1 = search_single(xi, hi, strand1_fixed, strand1_cur, strand1_next);
    let bp2 = search_single(xi, hi, strand2_fixed, strand2_cur, strand2_next);
    (bp1, bp2)
}
