// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Phase reconciliation (`spec.md` §4.4/§4.5): stitches per-window
//! optimal haplotype pairs into a continuous per-strand mosaic, by
//! either intersection mode or DP mode, with breakpoint refinement at
//! strand switches.
//!
//! A segment's `window_label` records the window in which its run
//! *started* (matching `spec.md` §4.4's procedural description, which
//! pushes a new segment only at a switch, not once per window). Per-row
//! materialization during imputation looks up the owning window for
//! each row independently rather than trusting the segment's stored
//! label for every row in a multi-window run — see `DESIGN.md`'s
//! reconciliation entry for why this reading was chosen over a
//! one-segment-per-window rendering.

pub mod dp;
pub mod intersection;

use crate::bitset::Bitset;
use crate::breakpoint::{self, NO_BREAK};
use crate::compressed_haplotypes::CompressedHaplotypes;
use crate::errors::Result;
use crate::io_interfaces::{GenotypeMatrixSource, ReferencePanelSource};
use crate::mosaic::{HaplotypeMosaic, HaplotypeMosaicPair, Segment};
use intersection::{IntersectionResult, SwitchKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FastMethod {
    Intersection,
    Dp,
}

/// Build a genotype/haplotype stretch spanning windows `w_prev` and
/// `w_cur` for one sample, in typed-marker row space, for breakpoint
/// search. Returns `(Xi, Hi, stretch_start_row)`.
fn breakpoint_stretch(
    ch: &CompressedHaplotypes,
    genotypes: &dyn GenotypeMatrixSource,
    panel: &dyn ReferencePanelSource,
    sample: usize,
    w_prev: usize,
    w_cur: usize,
) -> Result<(ndarray::Array2<Option<f64>>, ndarray::Array2<f64>, usize)> {
    let prev_panel = ch.window(w_prev)?;
    let cur_panel = ch.window(w_cur)?;
    let start = *prev_panel.start();
    let end = *cur_panel.start() + cur_panel.n_typed();
    let len = end - start;

    let d = ch.total_d();
    let xi = ndarray::Array2::from_shape_fn((len, 1), |(i, _)| genotypes.get(start + i, sample));
    let hi = ndarray::Array2::from_shape_fn((len, d), |(i, hap)| {
        let full_row = ch.typed_to_full()[start + i];
        panel.get(full_row, hap)
    });
    Ok((xi, hi, start))
}

/// Drive a single-strand breakpoint search at a switch boundary and
/// push the resulting segment(s), falling back to a plain switch at the
/// boundary row when the search returns the "no improvement" sentinel.
fn push_single_switch(
    mosaic: &mut HaplotypeMosaic,
    stretch_start: usize,
    fixed_label: usize,
    cur: usize,
    next: usize,
    window_of_next: usize,
    xi: &ndarray::Array2<Option<f64>>,
    hi: &ndarray::Array2<f64>,
) {
    let bp = breakpoint::search_single(xi, hi, fixed_label, cur, next);
    let split_row = if bp.bkpt == NO_BREAK {
        stretch_start + xi.nrows() / 2
    } else {
        stretch_start + (bp.bkpt as usize) + 1
    };
    mosaic.push(Segment::new(split_row, next, window_of_next));
}

/// Build one sample's `HaplotypeMosaicPair` from an intersection-mode
/// reconciliation result, refining each switch boundary with breakpoint
/// search.
pub fn build_mosaic_intersection(
    result: &IntersectionResult,
    ch: &CompressedHaplotypes,
    genotypes: &dyn GenotypeMatrixSource,
    panel: &dyn ReferencePanelSource,
    sample: usize,
) -> Result<HaplotypeMosaicPair> {
    let w_count = result.strand1.len();
    let total_typed = ch.total_typed_markers();
    let mut pair = HaplotypeMosaicPair::new(total_typed);

    let label1_of = |bs: &Bitset| bs.first_one().unwrap_or(0);
    let label2_of = |bs: &Bitset| bs.first_one().unwrap_or(0);

    if w_count == 0 {
        return Ok(pair);
    }

    pair.strand1
        .push(Segment::new(0, label1_of(&result.strand1[0]), 0));
    pair.strand2
        .push(Segment::new(0, label2_of(&result.strand2[0]), 0));

    for w in 1..w_count {
        let switch = result.switches[w - 1];
        if switch == SwitchKind::None {
            continue;
        }
        let (xi, hi, stretch_start) =
            breakpoint_stretch(ch, genotypes, panel, sample, w - 1, w)?;

        let prev1 = label1_of(&result.strand1[w - 1]);
        let cur1 = label1_of(&result.strand1[w]);
        let prev2 = label2_of(&result.strand2[w - 1]);
        let cur2 = label2_of(&result.strand2[w]);

        match switch {
            SwitchKind::Strand1 => {
                push_single_switch(
                    &mut pair.strand1,
                    stretch_start,
                    prev2,
                    prev1,
                    cur1,
                    w,
                    &xi,
                    &hi,
                );
            }
            SwitchKind::Strand2 => {
                push_single_switch(
                    &mut pair.strand2,
                    stretch_start,
                    prev1,
                    prev2,
                    cur2,
                    w,
                    &xi,
                    &hi,
                );
            }
            SwitchKind::Double => {
                let (bp1, bp2) = breakpoint::search_double(
                    &xi, &hi, prev2, prev1, cur1, prev1, prev2, cur2,
                );
                let split1 = if bp1.bkpt == NO_BREAK {
                    stretch_start + xi.nrows() / 2
                } else {
                    stretch_start + (bp1.bkpt as usize) + 1
                };
                let split2 = if bp2.bkpt == NO_BREAK {
                    stretch_start + xi.nrows() / 2
                } else {
                    stretch_start + (bp2.bkpt as usize) + 1
                };
                pair.strand1.push(Segment::new(split1, cur1, w));
                pair.strand2.push(Segment::new(split2, cur2, w));
            }
            SwitchKind::None => unreachable!(),
        }
    }

    Ok(pair)
}

/// Build one sample's `HaplotypeMosaicPair` directly from a DP-mode
/// solution: a new segment is pushed whenever the chosen candidate pair
/// changes from the previous window, refined with breakpoint search
/// exactly as in intersection mode.
pub fn build_mosaic_dp(
    candidates: &[Vec<dp::Pair>],
    chosen: &[usize],
    ch: &CompressedHaplotypes,
    genotypes: &dyn GenotypeMatrixSource,
    panel: &dyn ReferencePanelSource,
    sample: usize,
) -> Result<HaplotypeMosaicPair> {
    let w_count = candidates.len();
    let total_typed = ch.total_typed_markers();
    let mut pair = HaplotypeMosaicPair::new(total_typed);
    if w_count == 0 {
        return Ok(pair);
    }

    let first = candidates[0][chosen[0]];
    pair.strand1.push(Segment::new(0, first.0, 0));
    pair.strand2.push(Segment::new(0, first.1, 0));

    for w in 1..w_count {
        let prev = candidates[w - 1][chosen[w - 1]];
        let cur = candidates[w][chosen[w]];
        if prev == cur {
            continue;
        }
        let (xi, hi, stretch_start) =
            breakpoint_stretch(ch, genotypes, panel, sample, w - 1, w)?;

        let switch1 = prev.0 != cur.0;
        let switch2 = prev.1 != cur.1;
        if switch1 && switch2 {
            let (bp1, bp2) =
                breakpoint::search_double(&xi, &hi, prev.1, prev.0, cur.0, prev.0, prev.1, cur.1);
            let split1 = if bp1.bkpt == NO_BREAK {
                stretch_start + xi.nrows() / 2
            } else {
                stretch_start + (bp1.bkpt as usize) + 1
            };
            let split2 = if bp2.bkpt == NO_BREAK {
                stretch_start + xi.nrows() / 2
            } else {
                stretch_start + (bp2.bkpt as usize) + 1
            };
            pair.strand1.push(Segment::new(split1, cur.0, w));
            pair.strand2.push(Segment::new(split2, cur.1, w));
        } else if switch1 {
            push_single_switch(&mut pair.strand1, stretch_start, prev.1, prev.0, cur.0, w, &xi, &hi);
        } else if switch2 {
            push_single_switch(&mut pair.strand2, stretch_start, prev.0, prev.1, cur.1, w, &xi, &hi);
        }
    }

    Ok(pair)
}
