//! Mate-pair classification
//!
//! The decision procedure that turns one mate pair into a verdict: filtered
//! for a technical reason, a known Hi-C artifact, or a valid contact with two
//! bin assignments. Classification is a pure function of its inputs; the same
//! pair always yields the same verdict.
//!
//! The first four checks (chimeric resolution, unmapped, mapping quality,
//! duplicates) run in the sequential reading stage via [`prefilter`] and the
//! duplicate detector; everything from bin assignment onward runs inside the
//! workers via [`classify_pair`].

use crate::core::bins::BinIndex;
use crate::core::mate::{check_dangling_end, DanglingPatterns, MatePair, MateRecord};
use crate::core::restriction::RestrictionIndex;
use crate::core::BuildError;

/// Self-circles are only possible for close outward pairs
pub const SELF_CIRCLE_MAX_DISTANCE: u64 = 25_000;

/// Intra-chromosomal pairs closer than this are "short range" in the QC stats
pub const SHORT_RANGE_MAX_DISTANCE: u64 = 20_000;

/// Relative orientation of the two mates, using the genomically earlier mate
/// as "first".
///
/// ```text
/// outward            <---------------    ---------------->
/// inward             --------------->    <----------------
/// same-strand-right  --------------->    ---------------->
/// same-strand-left   <---------------    <----------------
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Inward,
    Outward,
    SameStrandLeft,
    SameStrandRight,
}

/// Distance class of a valid pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceClass {
    InterChromosomal,
    ShortRange,
    LongRange,
}

/// Outcome of classifying one mate pair. Exactly one verdict per pair;
/// evaluation order defines precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairVerdict {
    /// Either mate is flagged unmapped
    Unmapped,
    /// Mapping quality below the threshold
    LowQuality,
    /// Mapping quality at the aligner's multi-mapping value (0 for both mates)
    NonUnique,
    /// Mate-pair start positions seen before
    Duplicate,
    /// A mate's midpoint falls outside every bin
    NotNearRestrictionSite,
    /// Close outward pair without an intervening restriction site, discarded
    SelfCircle,
    /// Close inward pair with an intervening restriction site, discarded
    SelfLigation,
    /// Close inward pair without an intervening restriction site
    SameFragment,
    /// Re-ligation artifact; carries the index of the matching restriction
    /// sequence in the classifier config
    DanglingEnd(usize),
    /// A genuine contact
    Valid {
        /// Bin ids of mate 1 and mate 2, in that order
        bins: (u32, u32),
        /// `None` for inter-chromosomal pairs
        orientation: Option<Orientation>,
        distance: DistanceClass,
    },
}

/// Verdict plus the artifact tallies that fire even when the pair is retained.
///
/// A kept self-circle or self-ligation still counts toward its statistic while
/// proceeding to a `Valid` verdict; the flags keep those tallies attached to
/// the single classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairClassification {
    pub verdict: PairVerdict,
    pub noted_self_circle: bool,
    pub noted_self_ligation: bool,
}

/// Classifier policy and restriction-enzyme configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Restriction sequences, uppercased
    pub restriction_sequences: Vec<String>,
    /// Dangling-end patterns, parallel to `restriction_sequences`
    pub dangling_patterns: Vec<DanglingPatterns>,
    /// Upper end of the library insert size distribution
    pub max_insert_size: u64,
    pub min_mapping_quality: u8,
    pub keep_self_circles: bool,
    pub keep_self_ligation: bool,
}

impl ClassifierConfig {
    /// Build from paired restriction/dangling sequences.
    ///
    /// The two lists must have the same length and the same order; dangling
    /// detection without restriction sequences is a configuration error.
    pub fn new(
        restriction_sequences: &[String],
        dangling_sequences: &[String],
        max_insert_size: u64,
        min_mapping_quality: u8,
        keep_self_circles: bool,
        keep_self_ligation: bool,
    ) -> Result<Self, BuildError> {
        if !dangling_sequences.is_empty() && restriction_sequences.is_empty() {
            return Err(BuildError::Config(
                "dangling sequences require restriction sequences".to_string(),
            ));
        }
        if dangling_sequences.len() != restriction_sequences.len() {
            return Err(BuildError::Config(format!(
                "{} restriction sequences but {} dangling sequences; \
                 the lists must be parallel",
                restriction_sequences.len(),
                dangling_sequences.len()
            )));
        }
        Ok(Self {
            restriction_sequences: restriction_sequences
                .iter()
                .map(|s| s.to_ascii_uppercase())
                .collect(),
            dangling_patterns: dangling_sequences
                .iter()
                .map(|s| DanglingPatterns::new(s))
                .collect(),
            max_insert_size,
            min_mapping_quality,
            keep_self_circles,
            keep_self_ligation,
        })
    }
}

/// Reading-stage filters: unmapped and mapping-quality checks.
///
/// Returns `None` when the pair survives. The duplicate check lives with the
/// reader because it depends on read order.
pub fn prefilter(mate1: &MateRecord, mate2: &MateRecord, min_mapq: u8) -> Option<PairVerdict> {
    if mate1.is_unmapped || mate2.is_unmapped {
        return Some(PairVerdict::Unmapped);
    }
    if mate1.mapq < min_mapq || mate2.mapq < min_mapq {
        // bwa marks multi-mapping reads with mapq 0; the XS tag is not
        // reliable for this
        if mate1.mapq == 0 && mate2.mapq == 0 {
            return Some(PairVerdict::NonUnique);
        }
        return Some(PairVerdict::LowQuality);
    }
    None
}

/// Orientation for an intra-chromosomal pair, given the genomically earlier
/// mate first
pub fn orientation_of(first: &MateRecord, second: &MateRecord) -> Orientation {
    match (first.is_reverse, second.is_reverse) {
        (false, true) => Orientation::Inward,
        (true, false) => Orientation::Outward,
        (true, true) => Orientation::SameStrandLeft,
        (false, false) => Orientation::SameStrandRight,
    }
}

/// Any restriction site strictly inside the fragment envelope of the pair?
///
/// The envelope is shrunk by the restriction sequence length on each side so
/// only fragments internally containing a cut site qualify.
fn has_internal_site(
    mate1: &MateRecord,
    mate2: &MateRecord,
    config: &ClassifierConfig,
    rf_index: &RestrictionIndex,
) -> bool {
    let outer_start = mate1.pos.min(mate2.pos);
    let outer_end = (mate1.pos + mate1.aligned_len).max(mate2.pos + mate2.aligned_len);
    config.restriction_sequences.iter().any(|seq| {
        let shrink = seq.len() as u64;
        let frag_start = outer_start + shrink;
        let frag_end = outer_end.saturating_sub(shrink);
        rf_index.has_site_between(&mate1.chrom, frag_start, frag_end)
    })
}

/// Classify one mate pair (everything after the reading-stage filters).
///
/// Precedence: bin assignment, then orientation-dependent artifact filters,
/// then the valid verdict. Inter-chromosomal pairs skip the orientation
/// filters entirely.
pub fn classify_pair(
    pair: &MatePair,
    bin_index: &BinIndex,
    rf_index: &RestrictionIndex,
    config: &ClassifierConfig,
) -> PairClassification {
    let mate1 = &pair.mate1;
    let mate2 = &pair.mate2;

    let mut noted_self_circle = false;
    let mut noted_self_ligation = false;

    // bin assignment by genomic midpoint; a miss means the mate is not close
    // to any restriction site (or the contig has no bins at all)
    let bin1 = bin_index.lookup(&mate1.chrom, mate1.midpoint());
    let bin2 = bin_index.lookup(&mate2.chrom, mate2.midpoint());
    let (bin1, bin2) = match (bin1, bin2) {
        (Some(b1), Some(b2)) => (b1, b2),
        _ => {
            return PairClassification {
                verdict: PairVerdict::NotNearRestrictionSite,
                noted_self_circle: false,
                noted_self_ligation: false,
            }
        }
    };

    let same_chrom = mate1.chrom == mate2.chrom;
    let separation = mate1.pos.abs_diff(mate2.pos);

    let orientation = if same_chrom {
        let (first, second) = if mate1.pos < mate2.pos {
            (mate1, mate2)
        } else {
            (mate2, mate1)
        };
        Some(orientation_of(first, second))
    } else {
        None
    };

    if same_chrom && !config.restriction_sequences.is_empty() {
        if orientation == Some(Orientation::Outward) && separation < SELF_CIRCLE_MAX_DISTANCE {
            if !has_internal_site(mate1, mate2, config, rf_index) {
                noted_self_circle = true;
                if !config.keep_self_circles {
                    return PairClassification {
                        verdict: PairVerdict::SelfCircle,
                        noted_self_circle,
                        noted_self_ligation,
                    };
                }
            }
        }

        if orientation == Some(Orientation::Inward) && separation < config.max_insert_size {
            // dangling ends first; stop at the first matching sequence
            for (seq_idx, patterns) in config.dangling_patterns.iter().enumerate() {
                if check_dangling_end(mate1, patterns) || check_dangling_end(mate2, patterns) {
                    return PairClassification {
                        verdict: PairVerdict::DanglingEnd(seq_idx),
                        noted_self_circle,
                        noted_self_ligation,
                    };
                }
            }
            if !has_internal_site(mate1, mate2, config, rf_index) {
                return PairClassification {
                    verdict: PairVerdict::SameFragment,
                    noted_self_circle,
                    noted_self_ligation,
                };
            }
            noted_self_ligation = true;
            if !config.keep_self_ligation {
                return PairClassification {
                    verdict: PairVerdict::SelfLigation,
                    noted_self_circle,
                    noted_self_ligation,
                };
            }
        }
    }

    let distance = if !same_chrom {
        DistanceClass::InterChromosomal
    } else if separation < SHORT_RANGE_MAX_DISTANCE {
        DistanceClass::ShortRange
    } else {
        DistanceClass::LongRange
    };

    PairClassification {
        verdict: PairVerdict::Valid {
            bins: (bin1, bin2),
            orientation,
            distance,
        },
        noted_self_circle,
        noted_self_ligation,
    }
}
