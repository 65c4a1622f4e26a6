//! Restriction-site overlap index
//!
//! Per-chromosome interval lookup over restriction cut sites, backed by
//! rust-lapper. Built once from the parsed site list and shared read-only by
//! every worker; the classifier only needs "is there any site inside this
//! fragment envelope".

use crate::core::GenomicInterval;
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;

type SiteInterval = Interval<u64, u32>;

/// Immutable restriction-site lookup table
pub struct RestrictionIndex {
    maps: HashMap<String, Lapper<u64, u32>>,
}

impl RestrictionIndex {
    /// Build the index; site ids follow input order.
    pub fn new(sites: &[GenomicInterval]) -> Self {
        let mut by_chrom: HashMap<String, Vec<SiteInterval>> = HashMap::new();
        for (site_id, site) in sites.iter().enumerate() {
            by_chrom
                .entry(site.chrom.clone())
                .or_default()
                .push(Interval {
                    start: site.start,
                    stop: site.end,
                    val: site_id as u32,
                });
        }
        let maps = by_chrom
            .into_iter()
            .map(|(chrom, intervals)| (chrom, Lapper::new(intervals)))
            .collect();
        Self { maps }
    }

    /// Any restriction site overlapping `[start, end)` on `chrom`?
    ///
    /// Empty or inverted ranges never contain a site.
    pub fn has_site_between(&self, chrom: &str, start: u64, end: u64) -> bool {
        if start >= end {
            return false;
        }
        match self.maps.get(chrom) {
            Some(lapper) => lapper.find(start, end).next().is_some(),
            None => false,
        }
    }

    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.maps.contains_key(chrom)
    }

    /// Total number of indexed sites
    pub fn total_sites(&self) -> usize {
        self.maps.values().map(|l| l.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_index() -> RestrictionIndex {
        let sites = vec![
            GenomicInterval::new("chr1", 100, 106),
            GenomicInterval::new("chr1", 500, 506),
            GenomicInterval::new("chr2", 50, 56),
        ];
        RestrictionIndex::new(&sites)
    }

    #[test]
    fn test_site_overlap() {
        let index = create_test_index();
        assert!(index.has_site_between("chr1", 90, 110));
        assert!(index.has_site_between("chr1", 105, 600));
        assert!(!index.has_site_between("chr1", 110, 500));
        assert!(index.has_site_between("chr2", 0, 1000));
    }

    #[test]
    fn test_absent_chromosome() {
        let index = create_test_index();
        assert!(!index.has_site_between("chr3", 0, 1000));
    }

    #[test]
    fn test_degenerate_range() {
        let index = create_test_index();
        assert!(!index.has_site_between("chr1", 102, 102));
        assert!(!index.has_site_between("chr1", 200, 100));
    }

    #[test]
    fn test_total_sites() {
        assert_eq!(create_test_index().total_sites(), 3);
    }
}
