// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Chunk sizing (`spec.md` §4.3): bounds peak memory by capping the
//! number of windows processed in one pass so that `X` slab + per-thread
//! `M`/`N`/scratch + per-window OHS bit-sets stay within a fixed
//! fraction of available RAM.

/// Fraction of the declared memory budget the chunker is allowed to
/// actually use, per `spec.md` §4.3's design note.
pub const MEMORY_FRACTION: f64 = 0.8;

const BYTES_PER_F64: usize = 8;
const BYTES_PER_BITSET_WORD: usize = 8;

/// Inputs to the chunk-size calculator, per `spec.md` §4.3.
#[derive(Clone, Copy, Debug)]
pub struct ChunkSizingInputs {
    pub avg_unique_d: usize,
    pub total_d: usize,
    pub p_per_window: usize,
    pub n_samples: usize,
    pub threads: usize,
    pub size_x_bytes: usize,
    pub size_ch_bytes: usize,
    /// Total available RAM, in bytes, the caller is willing to spend.
    pub budget_bytes: usize,
}

/// Bytes of `M` + `N` + `Xwork` scratch held by one worker thread,
/// sized to the chunk's largest expected window.
fn per_thread_scratch_bytes(avg_unique_d: usize, p_per_window: usize, n_samples: usize) -> usize {
    let m_bytes = avg_unique_d * avg_unique_d * BYTES_PER_F64;
    let n_bytes = n_samples * avg_unique_d * BYTES_PER_F64;
    let xwork_bytes = p_per_window * n_samples * BYTES_PER_F64;
    m_bytes + n_bytes + xwork_bytes
}

/// Bytes of OHS bit-set storage (two strands per sample) for one window.
fn ohs_bytes_per_window(total_d: usize, n_samples: usize) -> usize {
    let words_per_bitset = (total_d + 63) / 64;
    2 * n_samples * words_per_bitset * BYTES_PER_BITSET_WORD
}

/// The largest number of windows that can be processed in one chunk
/// without exceeding `MEMORY_FRACTION` of `budget_bytes`, given fixed
/// costs (`CH`, the shared `X` slab, and one scratch buffer per thread)
/// and a per-window marginal cost (OHS bit-sets). Always returns at
/// least 1: a single window must be processable regardless of budget,
/// since correctness does not depend on chunk size.
pub fn max_windows_per_chunk(inputs: &ChunkSizingInputs) -> usize {
    let available = (inputs.budget_bytes as f64 * MEMORY_FRACTION) as usize;
    let per_thread = per_thread_scratch_bytes(inputs.avg_unique_d, inputs.p_per_window, inputs.n_samples);
    let fixed = inputs
        .size_ch_bytes
        .saturating_add(inputs.size_x_bytes)
        .saturating_add(per_thread.saturating_mul(inputs.threads.max(1)));

    if fixed >= available {
        return 1;
    }
    let remaining = available - fixed;
    let per_window = ohs_bytes_per_window(inputs.total_d, inputs.n_samples).max(1);
    (remaining / per_window).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> ChunkSizingInputs {
        ChunkSizingInputs {
            avg_unique_d: 200,
            total_d: 5000,
            p_per_window: 700,
            n_samples: 1000,
            threads: 8,
            size_x_bytes: 10_000_000,
            size_ch_bytes: 50_000_000,
            budget_bytes: 4_000_000_000,
        }
    }

    #[test]
    fn always_allows_at_least_one_window() {
        let mut inputs = base_inputs();
        inputs.budget_bytes = 1; // absurdly small budget
        assert_eq!(max_windows_per_chunk(&inputs), 1);
    }

    #[test]
    fn larger_budget_allows_more_windows() {
        let small = base_inputs();
        let mut large = base_inputs();
        large.budget_bytes *= 10;
        assert!(max_windows_per_chunk(&large) >= max_windows_per_chunk(&small));
    }

    #[test]
    fn more_samples_shrinks_window_capacity() {
        let few_samples = base_inputs();
        let mut many_samples = base_inputs();
        many_samples.n_samples *= 100;
        assert!(max_windows_per_chunk(&many_samples) <= max_windows_per_chunk(&few_samples));
    }
}
