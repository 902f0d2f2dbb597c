//! Error types shared by the matrix reader, tree construction and support phases.

use std::collections::TryReserveError;
use std::num::ParseFloatError;
use thiserror::Error;

/// Malformed or truncated matrix text. Row numbers are 1-based.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unable to read header with taxa count, found `{0}'")]
    Header(String),

    #[error("matrix row {row}: expected floating point number, found `{token}': {source}")]
    Numeric {
        row: usize,
        token: String,
        source: ParseFloatError,
    },

    #[error("reached end of input after {found} of {expected} matrix rows")]
    RowsTruncated { expected: usize, found: usize },

    #[error("matrix row {row} has {found} entries when {expected} were expected")]
    EntriesTruncated {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A matrix property that must hold before a tree can be built from it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Invariant {
    #[error("distance of taxon {taxon} to itself is not zero")]
    NonZeroDiagonal { taxon: usize },

    #[error("distance [{row}][{col}] differs from [{col}][{row}]")]
    Asymmetric { row: usize, col: usize },

    #[error("distance [{row}][{col}] = {value} is negative or not finite")]
    InvalidDistance { row: usize, col: usize, value: f64 },

    #[error("{names} taxon names do not match {entries} matrix entries")]
    ShapeMismatch { names: usize, entries: usize },

    #[error("tree has {leaves} leaves but the matrix has {taxa} taxa")]
    LeafCountMismatch { leaves: usize, taxa: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to read distance matrix input")]
    Io(#[from] std::io::Error),

    #[error("malformed distance matrix")]
    Format(#[from] FormatError),

    #[error("this computation requires at least {required} taxa, found {found}")]
    InsufficientTaxa { required: usize, found: usize },

    #[error("out of memory")]
    Allocation(#[from] TryReserveError),

    #[error("invalid distance matrix: {0}")]
    InvariantViolation(#[from] Invariant),

    #[error("unable to start worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
