// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Imputation writer interface (`spec.md` §4.7/§6): applies a sample's
//! strand mosaic (already remapped to full reference row space) to the
//! reference panel to produce `X1`/`X2`, and derives per-marker
//! imputation quality (IMPQ) from each window's pair-search score.

use crate::compressed_haplotypes::CompressedHaplotypes;
use crate::errors::{Error, Result};
use crate::io_interfaces::ReferencePanelSource;
use crate::mosaic::HaplotypeMosaicPair;

/// Broadcast one score per window (e.g. a sample's `hapscore` in each
/// window) across that window's typed marker rows, producing one score
/// per typed row — the `typed_score` the IMPQ contract (`spec.md` §6)
/// is defined in terms of.
pub fn broadcast_window_scores(ch: &CompressedHaplotypes, window_scores: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(ch.total_typed_markers());
    for w in 0..ch.n_windows() {
        let panel = ch.window(w).expect("window index in range");
        out.extend(std::iter::repeat(window_scores[w]).take(panel.n_typed()));
    }
    out
}

/// Expand per-typed-row scores to per-full-row IMPQ, per `spec.md` §6:
/// typed rows get their own score; untyped rows get the mean of the two
/// nearest typed scores (or the nearest boundary score outside the
/// typed range).
pub fn compute_impq(typed_to_full: &[usize], full_length: usize, typed_scores: &[f64]) -> Vec<f64> {
    assert_eq!(typed_to_full.len(), typed_scores.len());
    let mut impq = vec![0.0f64; full_length];
    if typed_to_full.is_empty() {
        return impq;
    }

    for full_row in 0..typed_to_full[0] {
        impq[full_row] = typed_scores[0];
    }
    for (k, &full_row) in typed_to_full.iter().enumerate() {
        impq[full_row] = typed_scores[k];
        let next_full_row = if k + 1 < typed_to_full.len() {
            typed_to_full[k + 1]
        } else {
            full_length
        };
        let next_score = if k + 1 < typed_scores.len() {
            typed_scores[k + 1]
        } else {
            typed_scores[k]
        };
        for between in (full_row + 1)..next_full_row.min(full_length) {
            impq[between] = (typed_scores[k] + next_score) / 2.0;
        }
    }
    let last_full_row = *typed_to_full.last().unwrap();
    let last_score = *typed_scores.last().unwrap();
    for full_row in (last_full_row + 1)..full_length {
        impq[full_row] = last_score;
    }
    impq
}

/// Materialize one sample's `X1`, `X2` from its (full-row-space) mosaic
/// and the reference panel, plus IMPQ derived from per-window scores.
pub fn materialize_sample(
    mosaic: &HaplotypeMosaicPair,
    panel: &dyn ReferencePanelSource,
    ch: &CompressedHaplotypes,
    window_scores: &[f64],
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let full_length = panel.n_full_markers();
    let mut x1 = Vec::with_capacity(full_length);
    let mut x2 = Vec::with_capacity(full_length);

    for full_row in 0..full_length {
        let (label1, window1) = mosaic
            .strand1
            .label_at(full_row)
            .ok_or(Error::UnknownWindowLabel { window: 0 })?;
        let (label2, window2) = mosaic
            .strand2
            .label_at(full_row)
            .ok_or(Error::UnknownWindowLabel { window: 0 })?;
        if window1 >= ch.n_windows() {
            return Err(Error::UnknownWindowLabel { window: window1 });
        }
        if window2 >= ch.n_windows() {
            return Err(Error::UnknownWindowLabel { window: window2 });
        }
        x1.push(panel.get(full_row, label1));
        x2.push(panel.get(full_row, label2));
    }

    let typed_scores = broadcast_window_scores(ch, window_scores);
    let impq = compute_impq(ch.typed_to_full(), full_length, &typed_scores);

    Ok((x1, x2, impq))
}
