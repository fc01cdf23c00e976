// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-thread scratch state for the pair-search kernel (`spec.md` §3,
//! "Pair-search state (per thread)"; §9 "Worker scratch"). One `Scratch`
//! per worker id; buffers grow monotonically and are never reallocated
//! per window once they reach the chunk's largest `d_w`.

use ndarray::{s, Array2, ArrayView2, ArrayViewMut2};

/// Five timers accumulated per thread across the whole run, per
/// `spec.md` §4.1: screening, `M`/`N` build, pair scan, rescreen,
/// expansion, in seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timers {
    pub t1_screening: f64,
    pub t2_build: f64,
    pub t3_scan: f64,
    pub t4_rescreen: f64,
    pub t5_expansion: f64,
}

impl Timers {
    pub fn merge(&mut self, other: &Timers) {
        self.t1_screening += other.t1_screening;
        self.t2_build += other.t2_build;
        self.t3_scan += other.t3_scan;
        self.t4_rescreen += other.t4_rescreen;
        self.t5_expansion += other.t5_expansion;
    }
}

/// Per-sample result of one window's pair scan, in the unique-column
/// index space of that window's `Uw`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairResult {
    pub a: usize,
    pub b: usize,
    pub hapscore: f64,
}

/// One worker's reusable buffers. Held behind a `Vec<Scratch>` indexed by
/// `rayon::current_thread_index()` in the driver; never shared across
/// threads.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    /// `M[a,b]` assembled in place by `objective::build_m_into`; sized to
    /// the chunk's largest `d_w` and reused, never reallocated per window.
    pub m: Array2<f64>,
    /// `N[j,a]` assembled in place by `objective::build_n_into`.
    pub n: Array2<f64>,
    pub timers: Timers,
}

impl Scratch {
    pub fn new() -> Self {
        Scratch::default()
    }

    /// Ensure `m` is at least `d x d` and `n` is at least `n_samples x d`,
    /// growing but never shrinking the underlying allocation.
    pub fn ensure_capacity(&mut self, d: usize, n_samples: usize) {
        if self.m.nrows() < d || self.m.ncols() < d {
            self.m = Array2::zeros((d, d));
        }
        if self.n.nrows() < n_samples || self.n.ncols() < d {
            self.n = Array2::zeros((n_samples, d));
        }
    }

    /// The `d x d` sub-view of `m` currently in use, after `ensure_capacity`
    /// has grown the backing allocation to at least `d x d`.
    pub fn m_mut(&mut self, d: usize) -> ArrayViewMut2<f64> {
        self.m.slice_mut(s![0..d, 0..d])
    }

    pub fn m_view(&self, d: usize) -> ArrayView2<f64> {
        self.m.slice(s![0..d, 0..d])
    }

    /// The `n_samples x d` sub-view of `n` currently in use.
    pub fn n_mut(&mut self, n_samples: usize, d: usize) -> ArrayViewMut2<f64> {
        self.n.slice_mut(s![0..n_samples, 0..d])
    }

    pub fn n_view(&self, n_samples: usize, d: usize) -> ArrayView2<f64> {
        self.n.slice(s![0..n_samples, 0..d])
    }
}
