//! Per-bin read coverage
//!
//! Bins are subdivided into fixed 10 bp windows purely to produce a coverage
//! summary (the maximum window depth per bin); coverage plays no role in
//! classification. The window layout is immutable and shared; each worker
//! owns its counter vector and the orchestrator adds them together.

use crate::core::GenomicInterval;

/// Window width in bp, independent of bin size
pub const COVERAGE_WINDOW: u64 = 10;

/// Immutable mapping from bin ids to ranges in the flat counter vector
#[derive(Debug, Clone)]
pub struct CoverageLayout {
    /// (first window index, window count) per bin
    ranges: Vec<(usize, usize)>,
    total_windows: usize,
}

impl CoverageLayout {
    pub fn new(bins: &[GenomicInterval]) -> Self {
        let mut ranges = Vec::with_capacity(bins.len());
        let mut total_windows = 0;
        for bin in bins {
            let count = (bin.len() / COVERAGE_WINDOW) as usize;
            ranges.push((total_windows, count));
            total_windows += count;
        }
        Self {
            ranges,
            total_windows,
        }
    }

    pub fn total_windows(&self) -> usize {
        self.total_windows
    }

    pub fn bin_count(&self) -> usize {
        self.ranges.len()
    }
}

/// One worker's coverage counters over a shared layout
#[derive(Debug, Clone)]
pub struct CoverageCounters {
    counts: Vec<u32>,
}

impl CoverageCounters {
    pub fn new(layout: &CoverageLayout) -> Self {
        Self {
            counts: vec![0; layout.total_windows],
        }
    }

    /// Record one read footprint inside its bin.
    ///
    /// Windows from the read start to the read end (clamped to the bin) are
    /// each incremented by one.
    pub fn add_read(
        &mut self,
        layout: &CoverageLayout,
        bin_id: u32,
        bin_start: u64,
        read_pos: u64,
        read_len: u64,
    ) {
        let Some(&(offset, window_count)) = layout.ranges.get(bin_id as usize) else {
            return;
        };
        let first = (read_pos.saturating_sub(bin_start) / COVERAGE_WINDOW) as usize;
        if first >= window_count {
            return;
        }
        let last = window_count.min(first + (read_len / COVERAGE_WINDOW) as usize);
        for window in &mut self.counts[offset + first..offset + last] {
            *window += 1;
        }
    }

    /// Add another worker's counters
    pub fn merge(&mut self, other: &CoverageCounters) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }

    /// Reduce to the maximum window depth per bin; untouched bins are `None`.
    pub fn bin_max(&self, layout: &CoverageLayout) -> Vec<Option<u32>> {
        layout
            .ranges
            .iter()
            .map(|&(offset, count)| {
                let max = self.counts[offset..offset + count]
                    .iter()
                    .copied()
                    .max()
                    .unwrap_or(0);
                if max == 0 {
                    None
                } else {
                    Some(max)
                }
            })
            .collect()
    }
}
