// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The compressed, read-only reference-panel dictionary (`CompressedHaplotypes`,
//! `spec.md` §3). Construction from a raw VCF/binary reference is out of
//! scope for this crate; `CompressedHaplotypes::from_dense` below is a
//! simple, non-optimized constructor kept for tests and for callers who
//! already hold a dense reference matrix in memory.

use std::collections::HashMap;

use getset::Getters;
use itertools::Itertools;
use ndarray::{Array2, Axis};

use crate::errors::{Error, Result};

/// Per-window slice of the compressed dictionary.
#[derive(Clone, Debug, Getters)]
pub struct WindowPanel {
    /// `p_w x d_w` bit-valued (0.0/1.0) matrix of unique haplotype columns.
    #[getset(get = "pub")]
    uw: Array2<f64>,
    /// Column index -> representative complete haplotype index.
    col_to_repr: Vec<usize>,
    /// Complete haplotype index -> column index in `uw` (inverse of the
    /// above, including non-representative members of an equivalence class).
    complete_to_col: Vec<usize>,
    /// Representative complete index -> full equivalence class (present
    /// only for classes of size > 1; singletons are absent and represent
    /// themselves, per `spec.md` §3).
    hapmap: HashMap<usize, Vec<usize>>,
    /// Absolute typed-marker row at which this window begins (0-based).
    #[getset(get = "pub")]
    start: usize,
    /// Per-marker alt-allele frequency within this window.
    #[getset(get = "pub")]
    altfreq: Vec<f64>,
}

impl WindowPanel {
    pub fn n_typed(&self) -> usize {
        self.uw.nrows()
    }

    pub fn d(&self) -> usize {
        self.uw.ncols()
    }

    /// The bit of `complete_idx` at `local_row` (row index within this
    /// window), looked up through the column mapping.
    pub fn bit(&self, complete_idx: usize, local_row: usize) -> f64 {
        let col = self.complete_to_col[complete_idx];
        self.uw[[local_row, col]]
    }

    /// Equivalence class (as complete indices) of the unique column `col`,
    /// including its representative.
    pub fn class_of_column(&self, col: usize) -> &[usize] {
        let repr = self.col_to_repr[col];
        match self.hapmap.get(&repr) {
            Some(members) => members,
            None => std::slice::from_ref(&self.col_to_repr[col]),
        }
    }
}

/// The full, read-only reference-panel dictionary: one `WindowPanel` per
/// window, plus the `typed_to_full` marker remapping and the constant
/// total haplotype count `D`.
#[derive(Clone, Debug, Getters)]
pub struct CompressedHaplotypes {
    windows: Vec<WindowPanel>,
    total_d: usize,
    /// `typed_to_full[typed_row]` gives the absolute row in the full
    /// reference panel, monotonically increasing.
    #[getset(get = "pub")]
    typed_to_full: Vec<usize>,
    #[getset(get = "pub")]
    chrom: String,
}

impl CompressedHaplotypes {
    pub fn n_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn total_d(&self) -> usize {
        self.total_d
    }

    pub fn total_typed_markers(&self) -> usize {
        self.typed_to_full.len()
    }

    pub fn window(&self, w: usize) -> Result<&WindowPanel> {
        self.windows.get(w).ok_or(Error::WindowIndexOutOfRange {
            window: w,
            total: self.windows.len(),
        })
    }

    /// Build a `CompressedHaplotypes` from a dense, fully phased reference
    /// matrix `h` (`p x D`, entries 0.0/1.0) sliced into fixed-width
    /// windows of `width` typed markers each (the last window may be
    /// short). This is NOT the optimized production loader described as
    /// out of scope in `spec.md` §1 — it exists for tests and for callers
    /// that already hold `h` as a dense matrix.
    pub fn from_dense(
        h: &Array2<f64>,
        width: usize,
        typed_to_full: Vec<usize>,
        altfreq: Vec<f64>,
        chrom: String,
    ) -> Result<Self> {
        let (p, total_d) = h.dim();
        if p != typed_to_full.len() || p != altfreq.len() {
            return Err(Error::ShapeMismatch {
                rows_x: typed_to_full.len(),
                rows_panel: p,
            });
        }

        let mut windows = Vec::new();
        let mut start = 0;
        while start < p {
            let end = (start + width).min(p);
            let block = h.slice(ndarray::s![start..end, ..]);

            // Deduplicate columns: first occurrence of a bit pattern
            // becomes the representative, matching ones collapse into its
            // equivalence class.
            let mut seen: HashMap<Vec<u64>, usize> = HashMap::new();
            let mut col_to_repr = Vec::new();
            let mut classes: HashMap<usize, Vec<usize>> = HashMap::new();
            let mut complete_to_col = vec![0usize; total_d];
            let mut unique_cols: Vec<Vec<f64>> = Vec::new();

            for complete_idx in 0..total_d {
                let col = block.column(complete_idx);
                let key: Vec<u64> = col.iter().map(|&v| v.to_bits()).collect();
                match seen.get(&key) {
                    Some(&existing_col) => {
                        let repr = col_to_repr[existing_col];
                        classes.entry(repr).or_insert_with(|| vec![repr]).push(complete_idx);
                        complete_to_col[complete_idx] = existing_col;
                    }
                    None => {
                        let new_col = unique_cols.len();
                        seen.insert(key, new_col);
                        col_to_repr.push(complete_idx);
                        complete_to_col[complete_idx] = new_col;
                        unique_cols.push(col.to_vec());
                    }
                }
            }

            let d_w = unique_cols.len();
            let mut uw = Array2::<f64>::zeros((end - start, d_w));
            for (col_idx, col) in unique_cols.into_iter().enumerate() {
                for (row, v) in col.into_iter().enumerate() {
                    uw[[row, col_idx]] = v;
                }
            }

            // drop singleton classes, per spec invariant ("singletons are
            // absent from the map and represent themselves").
            let hapmap: HashMap<usize, Vec<usize>> = classes
                .into_iter()
                .filter(|(_, members)| members.len() > 1)
                .collect();

            windows.push(WindowPanel {
                uw,
                col_to_repr,
                complete_to_col,
                hapmap,
                start,
                altfreq: altfreq[start..end].to_vec(),
            });

            start = end;
        }

        Ok(CompressedHaplotypes {
            windows,
            total_d,
            typed_to_full,
            chrom,
        })
    }
}

/// Empirical non-missing allele count, used only by tests to derive
/// `altfreq` from a dense panel when the caller has no external
/// frequency source.
pub fn empirical_altfreq(h: &Array2<f64>) -> Vec<f64> {
    h.axis_iter(Axis(0))
        .map(|row| row.iter().sum::<f64>() / (row.len() as f64))
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_panel() -> Array2<f64> {
        // 6 markers x 4 haplotypes; haplotypes 0 and 2 are identical.
        array![
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ]
    }

    #[test]
    fn dedups_identical_columns() {
        let h = toy_panel();
        let altfreq = empirical_altfreq(&h);
        let ch = CompressedHaplotypes::from_dense(&h, 6, (0..6).collect(), altfreq, "chr1".to_string())
            .unwrap();
        assert_eq!(ch.n_windows(), 1);
        let panel = ch.window(0).unwrap();
        assert_eq!(panel.d(), 3); // haplotypes {0,2} collapse to one column
        assert_eq!(panel.class_of_column(panel.complete_to_col[0]).len(), 2);
    }

    #[test]
    fn last_window_is_short() {
        let h = toy_panel();
        let altfreq = empirical_altfreq(&h);
        let ch = CompressedHaplotypes::from_dense(&h, 4, (0..6).collect(), altfreq, "chr1".to_string())
            .unwrap();
        assert_eq!(ch.n_windows(), 2);
        assert_eq!(ch.window(1).unwrap().n_typed(), 2);
    }

    #[test]
    fn every_complete_index_maps_to_a_column() {
        let h = toy_panel();
        let altfreq = empirical_altfreq(&h);
        let ch = CompressedHaplotypes::from_dense(&h, 6, (0..6).collect(), altfreq, "chr1".to_string())
            .unwrap();
        let panel = ch.window(0).unwrap();
        for complete_idx in 0..4 {
            assert!(panel.complete_to_col[complete_idx] < panel.d());
        }
    }
}
