//! Error types for FastHicBuild
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for matrix-building operations
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid configuration, detected before the pipeline starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// The two mate streams are out of sync
    #[error(
        "Input streams out of sync: mate 1 query '{qname1}' does not match mate 2 query '{qname2}'. \
         Be sure the two alignment files have the same read order \
         (with Bowtie2 or Hisat2 add the --reorder option)"
    )]
    InputDesync { qname1: String, qname2: String },

    /// A worker unit reported a failure; the run is aborted after draining
    #[error("Worker failure: {0}")]
    Worker(#[from] WorkerError),

    /// Input parsing errors (restriction BED, chrom.sizes)
    #[error("Invalid {format} file {path} at line {line}: {message}")]
    InvalidInput {
        format: &'static str,
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Errors from the BAM layer
    #[cfg(feature = "bam")]
    #[error("HTSlib error: {0}")]
    Bam(#[from] rust_htslib::errors::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside a worker unit.
///
/// These indicate conditions that could corrupt the matrix and are escalated
/// to a full-run abort; per-pair filter outcomes are statistics, not errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A classified pair referenced a bin id outside the matrix
    #[error("inconsistent bin assignment: bin {bin} >= matrix size {matrix_size}")]
    BinOutOfRange { bin: u32, matrix_size: u32 },

    /// A record in the batch could not be processed
    #[error("malformed record '{qname}': {message}")]
    MalformedRecord { qname: String, message: String },
}

/// Result type alias for matrix-building operations
pub type Result<T> = std::result::Result<T, BuildError>;
