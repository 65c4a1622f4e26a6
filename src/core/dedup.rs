//! PCR duplicate detection
//!
//! A compact membership test over mate-pair start positions. The unordered
//! endpoint pair is canonicalized and hashed into one `u64` digest; a pair is
//! a duplicate when its digest has been seen before. Duplicate detection is
//! order-dependent, so it runs in the sequential reading stage only.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Tracks every mate-pair start-position combination seen so far.
///
/// Memory grows linearly with the number of distinct combinations; callers may
/// skip duplicate checking entirely for memory-constrained runs.
#[derive(Debug, Default)]
pub struct ReadPositionSet {
    seen: HashSet<u64>,
}

impl ReadPositionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and records the pair on first sight, `true` on every
    /// subsequent sight of the same canonical pair. Symmetric in its two
    /// endpoints.
    pub fn is_duplicated(&mut self, chrom1: &str, pos1: u64, chrom2: &str, pos2: u64) -> bool {
        // canonical order: smaller (chrom, pos) endpoint first
        let (first, second) = if (chrom1, pos1) <= (chrom2, pos2) {
            ((chrom1, pos1), (chrom2, pos2))
        } else {
            ((chrom2, pos2), (chrom1, pos1))
        };

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        first.hash(&mut hasher);
        second.hash(&mut hasher);
        !self.seen.insert(hasher.finish())
    }

    /// Number of distinct pairs recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sight_is_not_duplicate() {
        let mut set = ReadPositionSet::new();
        assert!(!set.is_duplicated("1", 0, "2", 0));
        assert!(set.is_duplicated("1", 0, "2", 0));
        assert!(set.is_duplicated("1", 0, "2", 0));
    }

    #[test]
    fn test_symmetric_endpoints() {
        let mut set = ReadPositionSet::new();
        assert!(!set.is_duplicated("chrA", 1, "chrB", 2));
        assert!(set.is_duplicated("chrB", 2, "chrA", 1));
    }

    #[test]
    fn test_distinct_pairs_are_distinct() {
        let mut set = ReadPositionSet::new();
        assert!(!set.is_duplicated("chr1", 100, "chr2", 200));
        // swapping positions across endpoints is a different pair
        assert!(!set.is_duplicated("chr1", 200, "chr2", 100));
        assert!(!set.is_duplicated("chr1", 100, "chr2", 201));
        assert_eq!(set.len(), 3);
    }
}
