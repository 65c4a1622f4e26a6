//! Core matrix-building functionality
//!
//! This module contains the bin index, the pair classifier, the
//! parallel worker unit and the orchestration pipeline.

mod bins;
mod classify;
mod coverage;
mod dedup;
mod error;
mod mate;
mod matrix;
mod pipeline;
mod restriction;
mod stats;
mod worker;

pub use bins::{enlarge_bins, fixed_bins, restriction_bins, BinIndex, GenomicInterval};
pub use classify::{
    classify_pair, orientation_of, prefilter, ClassifierConfig, DistanceClass, Orientation,
    PairClassification, PairVerdict, SELF_CIRCLE_MAX_DISTANCE, SHORT_RANGE_MAX_DISTANCE,
};
pub use coverage::{CoverageCounters, CoverageLayout, COVERAGE_WINDOW};
pub use dedup::ReadPositionSet;
pub use error::{BuildError, Result, WorkerError};
pub use mate::{
    check_dangling_end, correct_map, revcomp_seq, CigarOp, DanglingPatterns, MatePair, MateRecord,
};
pub use matrix::{ContactMatrix, MatrixTriplet};
pub use pipeline::{
    BinInfo, BuildConfig, BuildOutput, MateStream, MatrixBuilder, ValidPairSink,
};
pub use restriction::RestrictionIndex;
pub use stats::{QcContext, RunStatistics};
pub use worker::{process_batch, WorkerDeps, WorkerOutput};
