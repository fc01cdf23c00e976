use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("typed genotype matrix has {rows_x} marker rows but the reference panel has {rows_panel}")]
    ShapeMismatch { rows_x: usize, rows_panel: usize },
    #[error("window {window} has an empty haplotype panel (d = 0); cannot search for a pair")]
    EmptyHaplotypePanel { window: usize },
    #[error("window {window} produced a non-finite entry in the pre-imputed working matrix")]
    NonFiniteWorkingMatrix { window: usize },
    #[error("haplotype mosaic references unknown window label {window}")]
    UnknownWindowLabel { window: usize },
    #[error("complete haplotype index {index} is out of range for a panel of size {total}")]
    HaplotypeIndexOutOfRange { index: usize, total: usize },
    #[error("window index {window} is out of range (panel has {total} windows)")]
    WindowIndexOutOfRange { window: usize, total: usize },
    #[error("chunk processing was cancelled")]
    Cancelled,
    #[error("failed to read configuration file: {0}")]
    Io(String),
    #[error("failed to parse configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
