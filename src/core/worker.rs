//! Worker unit
//!
//! Consumes one batch of mate pairs and produces an independent partial
//! result: matrix triplets, coverage counters, statistics and (optionally)
//! the indices of valid pairs for the output alignment stream. All shared
//! inputs are read-only; anything that could corrupt the matrix is returned
//! as a labeled [`WorkerError`] instead of being dropped.

use crate::core::bins::BinIndex;
use crate::core::classify::{
    classify_pair, ClassifierConfig, DistanceClass, Orientation, PairVerdict,
};
use crate::core::coverage::{CoverageCounters, CoverageLayout};
use crate::core::error::WorkerError;
use crate::core::mate::MatePair;
use crate::core::restriction::RestrictionIndex;
use crate::core::stats::RunStatistics;

/// Read-only dependencies shared by every worker
pub struct WorkerDeps<'a> {
    pub bin_index: &'a BinIndex,
    pub rf_index: &'a RestrictionIndex,
    pub config: &'a ClassifierConfig,
    pub coverage_layout: &'a CoverageLayout,
    /// Collect valid pair indices for the optional valid-pairs output
    pub collect_valid_indices: bool,
}

/// Partial result of one batch, folded into the orchestrator's accumulators
pub struct WorkerOutput {
    /// One (row, col) per valid pair, weight 1 each
    pub triplets: Vec<(u32, u32)>,
    pub coverage: CoverageCounters,
    pub stats: RunStatistics,
    /// Indices into the batch of pairs that belong in the valid-pairs stream
    pub valid_indices: Vec<usize>,
}

/// Classify a batch and accumulate its partial results.
pub fn process_batch(batch: &[MatePair], deps: &WorkerDeps) -> Result<WorkerOutput, WorkerError> {
    let matrix_size = deps.bin_index.len() as u32;
    let mut stats = RunStatistics::new(deps.config.restriction_sequences.len());
    let mut triplets = Vec::new();
    let mut coverage = CoverageCounters::new(deps.coverage_layout);
    let mut valid_indices = Vec::new();

    for (idx, pair) in batch.iter().enumerate() {
        stats.total += 1;

        let result = classify_pair(pair, deps.bin_index, deps.rf_index, deps.config);
        if result.noted_self_circle {
            stats.self_circle += 1;
        }
        if result.noted_self_ligation {
            stats.self_ligation += 1;
        }

        match result.verdict {
            PairVerdict::Unmapped => stats.one_mate_unmapped += 1,
            PairVerdict::LowQuality => stats.one_mate_low_quality += 1,
            PairVerdict::NonUnique => stats.one_mate_not_unique += 1,
            PairVerdict::Duplicate => stats.duplicated_pairs += 1,
            PairVerdict::NotNearRestrictionSite => stats.mate_not_close_to_rf += 1,
            // tallied through the noted flags above
            PairVerdict::SelfCircle | PairVerdict::SelfLigation => {}
            PairVerdict::SameFragment => stats.same_fragment += 1,
            PairVerdict::DanglingEnd(seq_idx) => {
                match stats.dangling_end.get_mut(seq_idx) {
                    Some(slot) => *slot += 1,
                    None => {
                        return Err(WorkerError::MalformedRecord {
                            qname: pair.mate1.qname.clone(),
                            message: format!(
                                "dangling-end sequence index {} out of range",
                                seq_idx
                            ),
                        })
                    }
                }
            }
            PairVerdict::Valid {
                bins: (bin1, bin2),
                orientation,
                distance,
            } => {
                if bin1 >= matrix_size || bin2 >= matrix_size {
                    return Err(WorkerError::BinOutOfRange {
                        bin: bin1.max(bin2),
                        matrix_size,
                    });
                }

                match distance {
                    DistanceClass::InterChromosomal => stats.inter_chromosomal += 1,
                    DistanceClass::ShortRange => stats.short_range += 1,
                    DistanceClass::LongRange => stats.long_range += 1,
                }
                match orientation {
                    Some(Orientation::Inward) => stats.count_inward += 1,
                    Some(Orientation::Outward) => stats.count_outward += 1,
                    Some(Orientation::SameStrandLeft) => stats.count_left += 1,
                    Some(Orientation::SameStrandRight) => stats.count_right += 1,
                    None => {}
                }

                for (mate, bin) in [(&pair.mate1, bin1), (&pair.mate2, bin2)] {
                    if let Some(bin_iv) = deps.bin_index.get(bin) {
                        coverage.add_read(
                            deps.coverage_layout,
                            bin,
                            bin_iv.start,
                            mate.pos,
                            mate.seq.len() as u64,
                        );
                    }
                }

                triplets.push((bin1, bin2));
                stats.pair_added += 1;
                if deps.collect_valid_indices {
                    valid_indices.push(idx);
                }
            }
        }
    }

    Ok(WorkerOutput {
        triplets,
        coverage,
        stats,
        valid_indices,
    })
}
