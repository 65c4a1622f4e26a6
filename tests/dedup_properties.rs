//! Property-based tests for the duplicate detector

use fast_hicbuild::core::ReadPositionSet;
use proptest::prelude::*;

fn arb_endpoint() -> impl Strategy<Value = (String, u64)> {
    ((1u8..=5), 0u64..1_000_000).prop_map(|(n, pos)| (format!("chr{}", n), pos))
}

proptest! {
    /// The first sighting of any endpoint pair is never a duplicate; the
    /// second always is.
    #[test]
    fn first_seen_then_duplicated(
        (chrom1, pos1) in arb_endpoint(),
        (chrom2, pos2) in arb_endpoint(),
    ) {
        let mut seen = ReadPositionSet::new();
        prop_assert!(!seen.is_duplicated(&chrom1, pos1, &chrom2, pos2));
        prop_assert!(seen.is_duplicated(&chrom1, pos1, &chrom2, pos2));
    }

    /// Mate order does not matter: (a, b) and (b, a) are the same pair.
    #[test]
    fn endpoint_order_is_irrelevant(
        (chrom1, pos1) in arb_endpoint(),
        (chrom2, pos2) in arb_endpoint(),
    ) {
        let mut seen = ReadPositionSet::new();
        prop_assert!(!seen.is_duplicated(&chrom1, pos1, &chrom2, pos2));
        prop_assert!(seen.is_duplicated(&chrom2, pos2, &chrom1, pos1));
    }

    /// Pairs differing in any endpoint stay distinct.
    #[test]
    fn distinct_pairs_not_flagged(
        (chrom1, pos1) in arb_endpoint(),
        (chrom2, pos2) in arb_endpoint(),
        shift in 1u64..1000,
    ) {
        let mut seen = ReadPositionSet::new();
        prop_assert!(!seen.is_duplicated(&chrom1, pos1, &chrom2, pos2));
        prop_assert!(!seen.is_duplicated(&chrom1, pos1, &chrom2, pos2 + shift));
    }
}
