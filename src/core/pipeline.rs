//! Matrix-building orchestrator
//!
//! Reads the two synchronized mate streams in lock-step, batches surviving
//! pairs, fans the batches out across a bounded rayon pool and folds every
//! worker's partial result back into one symmetric matrix plus run
//! statistics. Reading (including duplicate detection) is strictly
//! sequential; only classification and aggregation run in parallel. The
//! memory ceiling is `batch_size × threads` resident pairs.

use crate::core::bins::{enlarge_bins, BinIndex};
use crate::core::classify::{prefilter, ClassifierConfig, PairVerdict};
use crate::core::coverage::{CoverageCounters, CoverageLayout};
use crate::core::dedup::ReadPositionSet;
use crate::core::error::WorkerError;
use crate::core::matrix::{ContactMatrix, MatrixTriplet};
use crate::core::mate::{correct_map, MatePair, MateRecord};
use crate::core::restriction::RestrictionIndex;
use crate::core::stats::RunStatistics;
use crate::core::worker::{process_batch, WorkerDeps};
use crate::core::{BuildError, GenomicInterval, Result};
use rayon::prelude::*;

/// A pull-based source of aligned mate records.
///
/// Implemented by the BAM adapter; any iterator over records works for
/// synthetic inputs.
pub trait MateStream {
    fn next_record(&mut self) -> Result<Option<MateRecord>>;
}

impl<I: Iterator<Item = MateRecord>> MateStream for I {
    fn next_record(&mut self) -> Result<Option<MateRecord>> {
        Ok(self.next())
    }
}

/// Consumer for the optional valid-pairs output stream
pub trait ValidPairSink {
    fn write_pair(&mut self, pair: &MatePair) -> Result<()>;
}

/// Pipeline configuration beyond the classifier policy
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub classifier: ClassifierConfig,
    /// Worker count (the reading stage runs on the calling thread)
    pub threads: usize,
    /// Mate pairs per dispatched batch
    pub batch_size: usize,
    /// Skip the memory-hungry duplicate check entirely
    pub skip_duplication_check: bool,
    /// Stop reading after this many pairs (test-run mode)
    pub test_run_pairs: Option<u64>,
}

/// Lock-step reader over the two mate streams.
///
/// Skips secondary alignments, verifies query-name pairing, gathers announced
/// supplementary alignments and resolves the correct mapping, applies the
/// unmapped/quality prefilter and the duplicate check. Everything here is
/// order-dependent and must never be parallelized.
struct PairedReader<S1, S2> {
    stream1: S1,
    stream2: S2,
    dedup: Option<ReadPositionSet>,
    min_mapping_quality: u8,
    pairs_read: u64,
    exhausted: bool,
}

impl<S1: MateStream, S2: MateStream> PairedReader<S1, S2> {
    fn new(stream1: S1, stream2: S2, dedup: Option<ReadPositionSet>, min_mapping_quality: u8) -> Self {
        Self {
            stream1,
            stream2,
            dedup,
            min_mapping_quality,
            pairs_read: 0,
            exhausted: false,
        }
    }

    fn pairs_read(&self) -> u64 {
        self.pairs_read
    }

    fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pull the next primary record, skipping secondary alignments
    fn next_primary(stream: &mut impl MateStream) -> Result<Option<MateRecord>> {
        loop {
            match stream.next_record()? {
                Some(record) if record.is_secondary => continue,
                other => return Ok(other),
            }
        }
    }

    /// Pull the announced supplementary records and resolve the correct map.
    ///
    /// Supplementary gathering happens before any filtering so the two
    /// streams stay in sync even for unmapped pairs.
    fn resolve_supplementary(
        stream: &mut impl MateStream,
        primary: MateRecord,
    ) -> Result<MateRecord> {
        if primary.supplementary_count == 0 {
            return Ok(primary);
        }
        let mut supplements = Vec::with_capacity(primary.supplementary_count);
        for _ in 0..primary.supplementary_count {
            match stream.next_record()? {
                Some(record) => supplements.push(record),
                None => break,
            }
        }
        Ok(correct_map(primary, supplements))
    }

    /// Read one batch of up to `batch_size` surviving pairs.
    ///
    /// Filtered pairs are tallied into `stats` here; pairs placed in the
    /// batch are counted by the worker that processes them.
    fn read_batch(&mut self, batch_size: usize, stats: &mut RunStatistics) -> Result<Vec<MatePair>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            let Some(mate1) = Self::next_primary(&mut self.stream1)? else {
                self.exhausted = true;
                break;
            };
            let Some(mate2) = Self::next_primary(&mut self.stream2)? else {
                log::warn!("mate stream 2 ended before stream 1; dropping trailing record");
                self.exhausted = true;
                break;
            };
            self.pairs_read += 1;

            if mate1.qname != mate2.qname {
                return Err(BuildError::InputDesync {
                    qname1: mate1.qname,
                    qname2: mate2.qname,
                });
            }

            let mate1 = Self::resolve_supplementary(&mut self.stream1, mate1)?;
            let mate2 = Self::resolve_supplementary(&mut self.stream2, mate2)?;

            if let Some(verdict) = prefilter(&mate1, &mate2, self.min_mapping_quality) {
                stats.total += 1;
                match verdict {
                    PairVerdict::Unmapped => stats.one_mate_unmapped += 1,
                    PairVerdict::NonUnique => stats.one_mate_not_unique += 1,
                    _ => stats.one_mate_low_quality += 1,
                }
                continue;
            }

            if let Some(dedup) = self.dedup.as_mut() {
                if dedup.is_duplicated(&mate1.chrom, mate1.pos, &mate2.chrom, mate2.pos) {
                    stats.total += 1;
                    stats.duplicated_pairs += 1;
                    continue;
                }
            }

            batch.push(MatePair { mate1, mate2 });
        }
        Ok(batch)
    }
}

/// One bin of the finished matrix, with its coverage summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinInfo {
    pub interval: GenomicInterval,
    pub max_coverage: Option<u32>,
}

/// Everything the persistence and reporting collaborators consume
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Enlarged bin intervals, position = bin id
    pub bins: Vec<BinInfo>,
    /// Symmetric sparse matrix, sorted by (row, col)
    pub triplets: Vec<MatrixTriplet>,
    pub matrix_size: u32,
    pub stats: RunStatistics,
}

/// The top-level pipeline: immutable shared state plus the run loop.
pub struct MatrixBuilder {
    bins: Vec<GenomicInterval>,
    chrom_sizes: Vec<(String, u64)>,
    bin_index: BinIndex,
    rf_index: RestrictionIndex,
    coverage_layout: CoverageLayout,
    config: BuildConfig,
}

impl MatrixBuilder {
    /// Assemble the shared read-only structures for a run.
    pub fn new(
        bins: Vec<GenomicInterval>,
        chrom_sizes: Vec<(String, u64)>,
        restriction_sites: &[GenomicInterval],
        config: BuildConfig,
    ) -> Result<Self> {
        if bins.is_empty() {
            return Err(BuildError::Config(
                "no bins: check bin size, chromosome sizes and restriction sites".to_string(),
            ));
        }
        if config.batch_size == 0 {
            return Err(BuildError::Config("batch size must be positive".to_string()));
        }
        let coverage_layout = CoverageLayout::new(&bins);
        let bin_index = BinIndex::new(bins.clone());
        let rf_index = RestrictionIndex::new(restriction_sites);
        Ok(Self {
            bins,
            chrom_sizes,
            bin_index,
            rf_index,
            coverage_layout,
            config,
        })
    }

    pub fn matrix_size(&self) -> u32 {
        self.bin_index.len() as u32
    }

    /// Run the pipeline to completion.
    ///
    /// Reads batches, dispatches them across the worker pool, merges partial
    /// results, and finalizes the symmetric matrix, coverage and statistics.
    /// Any worker failure aborts the run after the in-flight round has been
    /// drained; no matrix output is produced.
    pub fn run<S1, S2>(
        &self,
        stream1: S1,
        stream2: S2,
        mut sink: Option<&mut dyn ValidPairSink>,
    ) -> Result<BuildOutput>
    where
        S1: MateStream,
        S2: MateStream,
    {
        let threads = self.config.threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| BuildError::Config(format!("failed to create thread pool: {}", e)))?;

        let dedup = if self.config.skip_duplication_check {
            None
        } else {
            Some(ReadPositionSet::new())
        };
        let mut reader = PairedReader::new(
            stream1,
            stream2,
            dedup,
            self.config.classifier.min_mapping_quality,
        );

        let matrix_size = self.matrix_size();
        let mut stats = RunStatistics::new(self.config.classifier.restriction_sequences.len());
        let mut matrix = ContactMatrix::new(matrix_size);
        let mut coverage = CoverageCounters::new(&self.coverage_layout);
        let mut worker_failure: Option<WorkerError> = None;

        let deps = WorkerDeps {
            bin_index: &self.bin_index,
            rf_index: &self.rf_index,
            config: &self.config.classifier,
            coverage_layout: &self.coverage_layout,
            collect_valid_indices: sink.is_some(),
        };

        loop {
            // READING: one batch per free worker slot; the reading stage
            // stalls here when every slot is occupied by the round in flight
            let mut batches: Vec<Vec<MatePair>> = Vec::new();
            while batches.len() < threads && !reader.exhausted() {
                if let Some(cap) = self.config.test_run_pairs {
                    if reader.pairs_read() >= cap {
                        log::warn!("early exit: test-run cap of {} pairs reached", cap);
                        break;
                    }
                }
                let batch = reader.read_batch(self.config.batch_size, &mut stats)?;
                if !batch.is_empty() {
                    batches.push(batch);
                }
            }
            if batches.is_empty() {
                break;
            }

            // DISPATCHED / COLLECTING
            log::debug!("dispatching {} batches", batches.len());
            let results: Vec<std::result::Result<_, WorkerError>> = pool
                .install(|| batches.par_iter().map(|b| process_batch(b, &deps)).collect());

            // MERGED: fold in dispatch order so the valid-pairs stream is
            // deterministic; merge itself is commutative
            for (batch, result) in batches.iter().zip(results) {
                match result {
                    Ok(output) => {
                        matrix.add_pairs(&output.triplets);
                        coverage.merge(&output.coverage);
                        stats.merge(&output.stats);
                        if let Some(sink) = sink.as_deref_mut() {
                            for idx in output.valid_indices {
                                sink.write_pair(&batch[idx])?;
                            }
                        }
                    }
                    Err(failure) => {
                        log::error!("worker failed: {}", failure);
                        worker_failure.get_or_insert(failure);
                    }
                }
            }

            // a failed worker poisons the run; the in-flight round above has
            // been drained, so stop reading and dispatching here
            if worker_failure.is_some() {
                break;
            }

            log::info!(
                "processed {} pairs, {} valid so far",
                stats.total,
                stats.pair_added
            );

            if let Some(cap) = self.config.test_run_pairs {
                if reader.pairs_read() >= cap {
                    break;
                }
            }
        }

        // DRAINING is complete: every dispatched batch has been merged
        if let Some(failure) = worker_failure {
            return Err(failure.into());
        }

        let triplets = matrix.finalize_symmetric();
        let enlarged = enlarge_bins(self.bins.clone(), &self.chrom_sizes);
        let maxes = coverage.bin_max(&self.coverage_layout);
        let bins = enlarged
            .into_iter()
            .zip(maxes)
            .map(|(interval, max_coverage)| BinInfo {
                interval,
                max_coverage,
            })
            .collect();

        Ok(BuildOutput {
            bins,
            triplets,
            matrix_size,
            stats,
        })
    }
}
