// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Window driver / chunker (`spec.md` §4.3): iterates a chunk's window
//! range under a `rayon` work-stealing thread pool, dispatching each
//! window to the pair-search kernel and redundancy expansion, and
//! accumulating per-thread timers. Windows within a chunk are
//! independent (`spec.md` §5), so this is a `par_iter` fan-out rather
//! than the ordered channel/worker-pool pipeline an I/O-bound streaming
//! job would need.

use std::sync::Mutex;

use rayon::prelude::*;

use crate::bitset::Bitset;
use crate::compressed_haplotypes::CompressedHaplotypes;
use crate::errors::Result;
use crate::io_interfaces::GenotypeMatrixSource;
use crate::kernel::scratch::{Scratch, Timers};
use crate::kernel::{self, KernelVariant};
use crate::redundancy;

/// Tunables driving the kernel dispatch for a chunk run, per `spec.md`
/// §6's "Tunables" list.
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    pub variant: KernelVariant,
    pub rescreen: bool,
    pub scale_allelefreq: bool,
    pub expand_redundants: bool,
}

/// Result of processing one window: per-sample redundancy-expanded
/// bit-sets, ready to be written into each sample's OHS.
pub struct WindowOutcome {
    pub window: usize,
    pub strand1: Vec<Bitset>,
    pub strand2: Vec<Bitset>,
}

/// Process a `[w0, w1)` window range, fanning work across up to
/// `n_threads` workers. Returns one `WindowOutcome` per window
/// (unordered guarantees relaxed internally, reordered back to `w0..w1`
/// before returning since the caller indexes OHS by absolute window).
pub fn run_chunk(
    ch: &CompressedHaplotypes,
    genotypes: &dyn GenotypeMatrixSource,
    config: DriverConfig,
    w0: usize,
    w1: usize,
    n_threads: usize,
) -> Result<(Vec<WindowOutcome>, Timers)> {
    let n_threads = n_threads.max(1);
    let scratches: Vec<Mutex<Scratch>> = (0..n_threads).map(|_| Mutex::new(Scratch::new())).collect();

    let outcomes: Result<Vec<WindowOutcome>> = (w0..w1)
        .into_par_iter()
        .map(|w| process_window(ch, genotypes, &config, w, &scratches, n_threads))
        .collect();
    let mut outcomes = outcomes?;
    outcomes.sort_by_key(|o| o.window);

    let mut total_timers = Timers::default();
    for scratch in &scratches {
        total_timers.merge(&scratch.lock().unwrap().timers);
    }

    Ok((outcomes, total_timers))
}

fn process_window(
    ch: &CompressedHaplotypes,
    genotypes: &dyn GenotypeMatrixSource,
    config: &DriverConfig,
    w: usize,
    scratches: &[Mutex<Scratch>],
    n_threads: usize,
) -> Result<WindowOutcome> {
    let panel = ch.window(w)?;
    let n_samples = genotypes.n_samples();
    let start = *panel.start();
    let xw = genotypes.slice(start..start + panel.n_typed(), 0..n_samples);

    let worker_id = rayon::current_thread_index().unwrap_or(0) % n_threads;
    let mut scratch = scratches[worker_id].lock().unwrap();

    let pair_results = kernel::run_window(
        w,
        &xw,
        panel.uw(),
        panel.altfreq(),
        config.variant,
        config.rescreen,
        config.scale_allelefreq,
        &mut scratch,
    )?;
    drop(scratch);

    let total_d = ch.total_d();
    let mut strand1 = Vec::with_capacity(n_samples);
    let mut strand2 = Vec::with_capacity(n_samples);
    for pair in pair_results {
        let (s1, s2) = redundancy::expand(panel, total_d, pair, config.expand_redundants);
        strand1.push(s1);
        strand2.push(s2);
    }

    Ok(WindowOutcome {
        window: w,
        strand1,
        strand2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressed_haplotypes::empirical_altfreq;
    use crate::io_interfaces::InMemoryGenotypes;
    use ndarray::array;

    #[test]
    fn single_chunk_fills_every_window_for_every_sample() {
        let h = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ];
        let altfreq = empirical_altfreq(&h);
        let ch = CompressedHaplotypes::from_dense(&h, 2, (0..4).collect(), altfreq, "chr1".to_string()).unwrap();

        let x = array![[Some(1.0), Some(0.0)], [Some(1.0), Some(0.0)], [Some(1.0), Some(1.0)], [Some(1.0), Some(1.0)]];
        let genotypes = InMemoryGenotypes::new(x);

        let config = DriverConfig {
            variant: KernelVariant::Exhaustive,
            rescreen: false,
            scale_allelefreq: false,
            expand_redundants: true,
        };

        let (outcomes, _timers) = run_chunk(&ch, &genotypes, config, 0, ch.n_windows(), 2).unwrap();
        assert_eq!(outcomes.len(), ch.n_windows());
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.window, i);
            assert_eq!(outcome.strand1.len(), 2);
            assert_eq!(outcome.strand2.len(), 2);
        }
    }
}
