// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Redundancy expansion (`spec.md` §4.2): translate a unique-column pair
//! `(a, b)` back through a window's equivalence classes into the two
//! complete-panel bit-sets consumed by phase reconciliation.

use crate::bitset::Bitset;
use crate::compressed_haplotypes::WindowPanel;
use crate::kernel::scratch::PairResult;

/// Expand one sample's unique-column pair into its two complete-panel
/// bit-sets. `expand_redundants` toggles between the full equivalence
/// class (`true`, the default per `spec.md` §9) and the bare
/// representative singleton (`false`).
pub fn expand(panel: &WindowPanel, total_d: usize, pair: PairResult, expand_redundants: bool) -> (Bitset, Bitset) {
    let strand1 = column_bitset(panel, total_d, pair.a, expand_redundants);
    let strand2 = column_bitset(panel, total_d, pair.b, expand_redundants);
    (strand1, strand2)
}

fn column_bitset(panel: &WindowPanel, total_d: usize, col: usize, expand_redundants: bool) -> Bitset {
    let mut bitset = Bitset::empty(total_d);
    if expand_redundants {
        for &member in panel.class_of_column(col) {
            bitset.set(member, true);
        }
    } else {
        // representative only: first entry of the column's class.
        let repr = panel.class_of_column(col)[0];
        bitset.set(repr, true);
    }
    bitset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressed_haplotypes::{empirical_altfreq, CompressedHaplotypes};
    use ndarray::array;

    fn toy_panel() -> CompressedHaplotypes {
        // haplotypes 0 and 2 are identical across all 3 rows.
        let h = array![
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 1.0, 1.0, 1.0],
        ];
        let altfreq = empirical_altfreq(&h);
        CompressedHaplotypes::from_dense(&h, 3, (0..3).collect(), altfreq, "chr1".to_string()).unwrap()
    }

    #[test]
    fn expand_redundants_true_includes_whole_equivalence_class() {
        let ch = toy_panel();
        let panel = ch.window(0).unwrap();
        let col0 = panel.class_of_column(0); // column for haplotype 0's pattern
        assert_eq!(col0.len(), 2); // {0, 2}
        let col_idx = 0; // first unique column corresponds to haplotypes 0/2
        let pair = PairResult { a: col_idx, b: col_idx, hapscore: 0.0 };
        let (s1, _s2) = expand(panel, ch.total_d(), pair, true);
        assert_eq!(s1.count_ones(), 2);
    }

    #[test]
    fn expand_redundants_false_yields_singleton() {
        let ch = toy_panel();
        let panel = ch.window(0).unwrap();
        let pair = PairResult { a: 0, b: 0, hapscore: 0.0 };
        let (s1, _s2) = expand(panel, ch.total_d(), pair, false);
        assert_eq!(s1.count_ones(), 1);
    }
}
