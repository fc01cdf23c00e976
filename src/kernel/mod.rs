// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The pair-search kernel (`spec.md` §4.1): dispatches a window's
//! genotype/haplotype slice to one of the screening variants, optionally
//! rescreens the result against the exact observed-entry residual, and
//! reports per-thread timers.
//!
//! `KernelVariant` is the screening strategy (matched once per window,
//! per `spec.md` §9); `rescreen` is an orthogonal boolean refinement
//! applied after any variant, not a fourth variant.

pub mod exhaustive;
pub mod lasso;
pub mod objective;
pub mod rescreen;
pub mod scratch;
pub mod thinning;

use std::time::Instant;

use ndarray::Array2;

use crate::errors::{Error, Result};
use scratch::{PairResult, Scratch};

/// Screening strategy selected once per window, per `spec.md` §4.1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelVariant {
    Exhaustive,
    LassoPrescreen { r: usize },
    Thinning { tf: usize },
}

/// Neighborhood radius (in unique-column index space) scanned by the
/// rescreen refinement around its input candidate.
const RESCREEN_RADIUS: usize = 2;

/// Run the full kernel contract for one window: pre-impute, optionally
/// scale, build `M`/`N`, dispatch to `variant`, optionally rescreen
/// against the true observed-entry residual, and return one `PairResult`
/// per sample (columns of `xw`), alongside the scratch's updated timers.
pub fn run_window(
    window: usize,
    xw: &Array2<Option<f64>>,
    uw: &Array2<f64>,
    altfreq: &[f64],
    variant: KernelVariant,
    rescreen_enabled: bool,
    scale_allelefreq: bool,
    scratch: &mut Scratch,
) -> Result<Vec<PairResult>> {
    let d = uw.ncols();
    let n_samples = xw.ncols();
    if d == 0 {
        return Err(Error::EmptyHaplotypePanel { window });
    }

    let t0 = Instant::now();
    let mut xwork = objective::pre_impute(window, xw)?;
    let mut u = uw.clone();
    if scale_allelefreq {
        objective::apply_scaling(&mut u, &mut xwork, altfreq);
    }
    scratch.timers.t1_screening += t0.elapsed().as_secs_f64();

    let t1 = Instant::now();
    scratch.ensure_capacity(d, n_samples);
    let gram = objective::build_gram(&u.view());
    objective::build_m_into(&gram, &mut scratch.m_mut(d));
    objective::build_n_into(&xwork.view(), &u.view(), &mut scratch.n_mut(n_samples, d));
    let sq_norms = objective::squared_norms(&xwork.view());
    scratch.timers.t2_build += t1.elapsed().as_secs_f64();

    let t2 = Instant::now();
    let sq_norms_slice = sq_norms.as_slice().expect("contiguous squared norms");
    let mut results = {
        let m = scratch.m_view(d);
        let n = scratch.n_view(n_samples, d);
        match variant {
            KernelVariant::Exhaustive => exhaustive::scan_all(m, n, sq_norms_slice),
            KernelVariant::LassoPrescreen { r } => lasso::scan_all_lasso(m, n, &gram, sq_norms_slice, r),
            KernelVariant::Thinning { tf } => thinning::scan_all_thinned(m, n, sq_norms_slice, tf),
        }
    };
    scratch.timers.t3_scan += t2.elapsed().as_secs_f64();

    if rescreen_enabled {
        let t3 = Instant::now();
        results = rescreen::rescreen_all(xw, &u, &results, RESCREEN_RADIUS);
        scratch.timers.t4_rescreen += t3.elapsed().as_secs_f64();
    }

    for result in &results {
        if !result.hapscore.is_finite() || result.hapscore < 0.0 {
            return Err(Error::NonFiniteWorkingMatrix { window });
        }
        debug_assert!(result.a <= result.b && result.b < d);
    }

    Ok(results)
}
