// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Narrow interfaces to the out-of-scope collaborators named in
//! `spec.md` §1/§9: VCF/binary-haplotype I/O, construction of `CH` from
//! a raw reference, and final record emission. This crate only consumes
//! these through the traits below; `InMemoryPanel`/`InMemoryWriter` are
//! minimal concrete implementations for tests and for callers who
//! already hold everything in memory.

use bio_types::genome;
use ndarray::Array2;

use crate::errors::{Error, Result};

/// The genomic position a full-reference row corresponds to, for
/// callers rendering `PhaseWriter` output against a real contig/position
/// pair rather than a bare row index.
pub fn locus(chrom: &str, pos: u64) -> genome::Locus {
    genome::Locus::new(chrom.to_owned(), pos)
}

/// Read-only access to the typed genotype matrix `X` (`spec.md` §6).
/// Entries are `{0, 1, 2, missing}`, exposed as `Option<f64>`.
pub trait GenotypeMatrixSource: Sync {
    fn n_typed_markers(&self) -> usize;
    fn n_samples(&self) -> usize;
    fn get(&self, typed_row: usize, sample: usize) -> Option<f64>;

    /// A `rows.len() x samples.len()` slice, built from repeated `get`
    /// calls. Callers needing a window's worth of genotypes use this
    /// instead of re-deriving the loop themselves.
    fn slice(&self, rows: std::ops::Range<usize>, samples: std::ops::Range<usize>) -> Array2<Option<f64>> {
        Array2::from_shape_fn((rows.len(), samples.len()), |(i, j)| {
            self.get(rows.start + i, samples.start + j)
        })
    }
}

/// Read-only access to the full (typed + untyped) reference panel `H`
/// (`spec.md` §6), a `P_full x D` bit matrix.
pub trait ReferencePanelSource: Sync {
    fn n_full_markers(&self) -> usize;
    fn n_haplotypes(&self) -> usize;
    fn get(&self, full_row: usize, haplotype: usize) -> f64;

    fn slice(&self, rows: std::ops::Range<usize>, haplotypes: std::ops::Range<usize>) -> Array2<f64> {
        Array2::from_shape_fn((rows.len(), haplotypes.len()), |(i, j)| {
            self.get(rows.start + i, haplotypes.start + j)
        })
    }
}

/// Sink for the per-sample phased mosaic and imputation quality output
/// (`spec.md` §6). `write_sample` is called once per sample after
/// imputation; implementations decide how to render `X1`/`X2` and IMPQ
/// (to VCF records, to an in-memory buffer, etc).
pub trait PhaseWriter {
    fn write_sample(&mut self, sample: usize, x1: &[f64], x2: &[f64], impq: &[f64]) -> Result<()>;
}

/// A dense, fully in-memory `GenotypeMatrixSource`.
pub struct InMemoryGenotypes {
    data: Array2<Option<f64>>,
}

impl InMemoryGenotypes {
    pub fn new(data: Array2<Option<f64>>) -> Self {
        InMemoryGenotypes { data }
    }
}

impl GenotypeMatrixSource for InMemoryGenotypes {
    fn n_typed_markers(&self) -> usize {
        self.data.nrows()
    }

    fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    fn get(&self, typed_row: usize, sample: usize) -> Option<f64> {
        self.data[[typed_row, sample]]
    }
}

/// A dense, fully in-memory `ReferencePanelSource`.
pub struct InMemoryPanel {
    data: Array2<f64>,
}

impl InMemoryPanel {
    pub fn new(data: Array2<f64>) -> Self {
        InMemoryPanel { data }
    }
}

impl ReferencePanelSource for InMemoryPanel {
    fn n_full_markers(&self) -> usize {
        self.data.nrows()
    }

    fn n_haplotypes(&self) -> usize {
        self.data.ncols()
    }

    fn get(&self, full_row: usize, haplotype: usize) -> f64 {
        self.data[[full_row, haplotype]]
    }
}

/// Separator byte used when rendering phased vs. unphased alleles,
/// matching the writer contract in `spec.md` §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseSeparator {
    Phased,
    Unphased,
}

impl PhaseSeparator {
    pub fn byte(self) -> u8 {
        match self {
            PhaseSeparator::Phased => b'|',
            PhaseSeparator::Unphased => b'/',
        }
    }
}

/// A simple `Vec`-backed `PhaseWriter` for tests and library consumers
/// who want the output in memory rather than streamed to a file.
#[derive(Default)]
pub struct InMemoryWriter {
    pub records: Vec<(usize, Vec<f64>, Vec<f64>, Vec<f64>)>,
}

impl PhaseWriter for InMemoryWriter {
    fn write_sample(&mut self, sample: usize, x1: &[f64], x2: &[f64], impq: &[f64]) -> Result<()> {
        if x1.len() != x2.len() || x1.len() != impq.len() {
            return Err(Error::ShapeMismatch {
                rows_x: x1.len(),
                rows_panel: x2.len(),
            });
        }
        self.records
            .push((sample, x1.to_vec(), x2.to_vec(), impq.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn in_memory_genotypes_slices_correctly() {
        let data = array![[Some(0.0), Some(1.0)], [None, Some(2.0)]];
        let source = InMemoryGenotypes::new(data);
        let slice = source.slice(0..2, 0..2);
        assert_eq!(slice[[0, 0]], Some(0.0));
        assert_eq!(slice[[1, 0]], None);
    }

    #[test]
    fn locus_carries_chrom_and_position() {
        use bio_types::genome::AbstractLocus;
        let l = locus("chr1", 12345);
        assert_eq!(l.contig(), "chr1");
        assert_eq!(l.pos(), 12345);
    }

    #[test]
    fn phase_separator_bytes_match_contract() {
        assert_eq!(PhaseSeparator::Phased.byte(), b'|');
        assert_eq!(PhaseSeparator::Unphased.byte(), b'/');
    }

    #[test]
    fn in_memory_writer_rejects_length_mismatch() {
        let mut writer = InMemoryWriter::default();
        let err = writer.write_sample(0, &[1.0, 2.0], &[1.0], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
