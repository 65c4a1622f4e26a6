//! Genomic bins and the bin index
//!
//! Bins are the rows/columns of the contact matrix. They are built either by
//! tiling every chromosome with fixed-width windows or from restriction-site
//! positions, and looked up by genomic midpoint with a per-chromosome binary
//! search. The index is built once and shared read-only by every worker.

use std::collections::HashMap;

/// A half-open genomic interval `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenomicInterval {
    /// Chromosome name
    pub chrom: String,
    /// Start position (0-based, inclusive)
    pub start: u64,
    /// End position (exclusive)
    pub end: u64,
}

impl GenomicInterval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        let chrom = chrom.into();
        debug_assert!(start < end, "empty interval {}:{}-{}", chrom, start, end);
        Self { chrom, start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Tile every chromosome with fixed-width bins.
///
/// For a chromosome of length `L` and width `W` this emits
/// `[0,W), [W,2W), ..., [⌊L/W⌋·W, L)`, in chromosome order.
pub fn fixed_bins(bin_size: u64, chrom_sizes: &[(String, u64)]) -> Vec<GenomicInterval> {
    assert!(bin_size > 0, "bin size must be positive");
    let mut bins = Vec::new();
    for (chrom, size) in chrom_sizes {
        let mut start = 0;
        while start < *size {
            bins.push(GenomicInterval::new(
                chrom.clone(),
                start,
                (*size).min(start + bin_size),
            ));
            start += bin_size;
        }
    }
    bins
}

/// Build bins around restriction sites.
///
/// The goal is bins that each contain a restriction site close to their
/// center. Sites on the same chromosome whose starts are less than
/// `min_distance` apart (beyond the site length itself) are merged into one.
/// Every retained site is extended by `max_distance` on both sides; where the
/// extensions of neighboring sites overlap, the bins are fused at the midpoint
/// of the overlap. Bins shorter than `min_distance` are discarded, so the
/// result may leave gaps (resolved later by [`enlarge_bins`]).
///
/// `sites` must be sorted by chromosome and start.
pub fn restriction_bins(
    sites: &[GenomicInterval],
    min_distance: u64,
    max_distance: u64,
) -> Vec<GenomicInterval> {
    if sites.is_empty() {
        return Vec::new();
    }
    log::info!(
        "minimum distance between restriction sites: {}, max distance to bin border: {}",
        min_distance,
        max_distance
    );

    let site_len = sites[0].end - sites[0].start;

    // sites folded into their predecessor
    let mut merged = vec![false; sites.len()];
    for idx in 1..sites.len() {
        if sites[idx].chrom == sites[idx - 1].chrom {
            let gap = (sites[idx].start - sites[idx - 1].start).saturating_sub(site_len);
            merged[idx] = gap <= min_distance;
        }
    }

    // extended boundaries, signed so the overlap arithmetic below matches
    // before clamping at zero
    let ext_start: Vec<i64> = sites
        .iter()
        .map(|s| s.start as i64 - max_distance as i64)
        .collect();
    let ext_end: Vec<i64> = sites
        .iter()
        .map(|s| s.end as i64 + max_distance as i64)
        .collect();

    let mut new_chrom: Vec<&str> = vec![&sites[0].chrom];
    let mut new_start: Vec<i64> = vec![ext_start[0].max(0)];
    let mut new_end: Vec<i64> = Vec::new();

    for idx in 1..sites.len() {
        if sites[idx].chrom != sites[idx - 1].chrom {
            new_start.push(ext_start[idx].max(0));
            new_end.push(ext_end[idx - 1]);
            new_chrom.push(&sites[idx].chrom);
            continue;
        }
        if merged[idx] {
            continue;
        }
        if ext_end[idx - 1] > ext_start[idx] {
            // neighboring extensions overlap: fuse at the midpoint
            let middle = ext_start[idx] + (ext_end[idx - 1] - ext_start[idx]) / 2;
            new_start.push(middle);
            new_end.push(middle);
        } else {
            new_start.push(ext_start[idx]);
            new_end.push(ext_end[idx - 1]);
        }
        new_chrom.push(&sites[idx].chrom);
    }
    new_end.push(ext_end[sites.len() - 1]);

    debug_assert_eq!(new_chrom.len(), new_start.len());
    debug_assert_eq!(new_chrom.len(), new_end.len());

    new_chrom
        .into_iter()
        .zip(new_start.into_iter().zip(new_end))
        .filter(|(_, (start, end))| end - start >= min_distance as i64)
        .map(|(chrom, (start, end))| {
            GenomicInterval::new(chrom, start.max(0) as u64, end.max(0) as u64)
        })
        .collect()
}

/// Stretch bins so that consecutive bins on one chromosome touch.
///
/// The first bin of each chromosome starts at 0, the last ends at the
/// chromosome size and interior gaps are split at their midpoint. This is a
/// reporting step applied after classification; bin ids are never re-assigned.
pub fn enlarge_bins(
    mut bins: Vec<GenomicInterval>,
    chrom_sizes: &[(String, u64)],
) -> Vec<GenomicInterval> {
    if bins.is_empty() {
        return bins;
    }
    let sizes: HashMap<&str, u64> = chrom_sizes
        .iter()
        .map(|(chrom, size)| (chrom.as_str(), *size))
        .collect();

    bins[0].start = 0;
    for idx in 0..bins.len() - 1 {
        if bins[idx].chrom == bins[idx + 1].chrom {
            if bins[idx].end != bins[idx + 1].start {
                let gap = bins[idx + 1].start - bins[idx].end;
                let middle = bins[idx + 1].start - gap / 2;
                bins[idx].end = middle;
                bins[idx + 1].start = middle;
            }
        } else {
            if let Some(size) = sizes.get(bins[idx].chrom.as_str()) {
                bins[idx].end = *size;
            }
            bins[idx + 1].start = 0;
        }
    }
    let last = bins.len() - 1;
    if let Some(size) = sizes.get(bins[last].chrom.as_str()) {
        bins[last].end = *size;
    }
    bins
}

/// Midpoint lookup over the ordered bin list.
///
/// Bin ids are dense `0..N-1` identifiers assigned in input order (chromosome
/// order, then position). Built once per run; workers share it by reference
/// and never mutate it.
pub struct BinIndex {
    intervals: Vec<GenomicInterval>,
    /// chromosome -> index range into `intervals`
    chrom_ranges: HashMap<String, (usize, usize)>,
}

impl BinIndex {
    /// Build the index from bins sorted by chromosome and start.
    pub fn new(intervals: Vec<GenomicInterval>) -> Self {
        let mut chrom_ranges: HashMap<String, (usize, usize)> = HashMap::new();
        let mut range_start = 0;
        for idx in 1..=intervals.len() {
            let chrom_changed =
                idx == intervals.len() || intervals[idx].chrom != intervals[range_start].chrom;
            if chrom_changed {
                chrom_ranges.insert(intervals[range_start].chrom.clone(), (range_start, idx));
                range_start = idx;
            }
        }
        Self {
            intervals,
            chrom_ranges,
        }
    }

    /// Number of bins (the matrix dimension)
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The ordered bin intervals; the position of each interval is its bin id.
    pub fn intervals(&self) -> &[GenomicInterval] {
        &self.intervals
    }

    pub fn get(&self, bin_id: u32) -> Option<&GenomicInterval> {
        self.intervals.get(bin_id as usize)
    }

    /// Find the bin containing a genomic midpoint.
    ///
    /// Returns `None` when the chromosome is absent from the index or the
    /// position falls into a gap between bins. Callers treat that as a
    /// filtered pair, not an error.
    pub fn lookup(&self, chrom: &str, pos: u64) -> Option<u32> {
        let &(lo, hi) = self.chrom_ranges.get(chrom)?;
        let slice = &self.intervals[lo..hi];
        // first bin with start > pos; the candidate is its predecessor
        let idx = slice.partition_point(|bin| bin.start <= pos);
        if idx == 0 {
            return None;
        }
        let candidate = &slice[idx - 1];
        if pos < candidate.end {
            Some((lo + idx - 1) as u32)
        } else {
            None
        }
    }

    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.chrom_ranges.contains_key(chrom)
    }
}
