//! fast-hicbuild - Hi-C contact matrix construction from paired alignments
//!
//! Builds a sparse, symmetric Hi-C interaction matrix from two alignment
//! streams holding the forward and reverse mates of a paired-end run.
//!
//! # Features
//!
//! - Mate-pair classification (dangling ends, self circles, self ligations,
//!   same-fragment and valid Hi-C contacts)
//! - Fixed-size or restriction-fragment binning
//! - Parallel classification with rayon behind a strictly sequential,
//!   duplicate-aware reading stage
//! - Deterministic output for any worker count
//!
//! # Example
//!
//! ```ignore
//! use fast_hicbuild::{fixed_bins, BuildConfig, ClassifierConfig, MatrixBuilder};
//!
//! let chrom_sizes = vec![("chr1".to_string(), 50_000_000)];
//! let bins = fixed_bins(10_000, &chrom_sizes);
//!
//! let config = BuildConfig {
//!     classifier: ClassifierConfig::new(&[], &[], 1000, 15, false, false)?,
//!     threads: 4,
//!     batch_size: 100_000,
//!     skip_duplication_check: false,
//!     test_run_pairs: None,
//! };
//!
//! let builder = MatrixBuilder::new(bins, chrom_sizes, &[], config)?;
//! let output = builder.run(stream1, stream2, None)?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    fixed_bins, restriction_bins, BinIndex, BuildConfig, BuildError, BuildOutput,
    ClassifierConfig, ContactMatrix, GenomicInterval, MatePair, MateRecord, MatrixBuilder,
    MatrixTriplet, PairVerdict, Result, RunStatistics,
};
