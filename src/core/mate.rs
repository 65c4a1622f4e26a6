//! Aligned mate records
//!
//! Plain representations of aligned reads, decoupled from any file format so
//! the classifier and pipeline can be driven by synthetic records in tests.
//! Includes the chimeric-alignment resolution and dangling-end sequence checks.

/// CIGAR operation subset needed for split-read resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(u32),
    Insertion(u32),
    Deletion(u32),
    Skip(u32),
    SoftClip(u32),
    HardClip(u32),
    Padding(u32),
    Equal(u32),
    Diff(u32),
}

impl CigarOp {
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Insertion(n)
            | CigarOp::Deletion(n)
            | CigarOp::Skip(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n)
            | CigarOp::Padding(n)
            | CigarOp::Equal(n)
            | CigarOp::Diff(n) => *n,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, CigarOp::Match(_))
    }
}

/// One aligned mate record.
///
/// Positions are 0-based; `aligned_len` is the query span aligned against the
/// reference (soft clips excluded), which the classifier uses for genomic
/// midpoints and fragment envelopes.
#[derive(Debug, Clone)]
pub struct MateRecord {
    pub qname: String,
    /// Reference name; meaningless when `is_unmapped`
    pub chrom: String,
    pub pos: u64,
    pub is_reverse: bool,
    pub is_unmapped: bool,
    pub is_secondary: bool,
    pub mapq: u8,
    pub cigar: Vec<CigarOp>,
    pub seq: Vec<u8>,
    pub aligned_len: u64,
    /// Number of supplementary alignments announced (SA tag entries); the
    /// stream yields them as the immediately following records
    pub supplementary_count: usize,
}

impl MateRecord {
    /// Genomic midpoint of the aligned portion, used for bin assignment
    pub fn midpoint(&self) -> u64 {
        self.pos + self.aligned_len / 2
    }

    /// Length of the read prefix (in read-sequence order) that is not part of
    /// the first aligned match. For reverse reads the CIGAR is scanned from
    /// the end, so the prefix is measured from the read's 5' end either way.
    pub fn unmatched_prefix(&self) -> u64 {
        let mut sum = 0u64;
        let ops: Box<dyn Iterator<Item = &CigarOp>> = if self.is_reverse {
            Box::new(self.cigar.iter().rev())
        } else {
            Box::new(self.cigar.iter())
        };
        for op in ops {
            if op.is_match() {
                break;
            }
            sum += op.len() as u64;
        }
        sum
    }
}

/// A mate pair after lock-step reading and chimeric resolution
#[derive(Debug, Clone)]
pub struct MatePair {
    pub mate1: MateRecord,
    pub mate2: MateRecord,
}

/// Pick the correctly mapped segment of a split read.
///
/// A restriction site inside a long read can split its alignment; only the
/// segment that starts mapping earliest in read-sequence order is the correct
/// one. Supplements whose query name differs from the primary are ignored.
pub fn correct_map(primary: MateRecord, supplements: Vec<MateRecord>) -> MateRecord {
    let mut best = primary;
    let mut best_prefix = best.unmatched_prefix();
    for candidate in supplements {
        if candidate.qname != best.qname {
            log::warn!(
                "supplementary alignment '{}' does not match primary '{}', skipping",
                candidate.qname,
                best.qname
            );
            continue;
        }
        let prefix = candidate.unmatched_prefix();
        if prefix < best_prefix {
            best_prefix = prefix;
            best = candidate;
        }
    }
    best
}

/// Reverse complement of a DNA sequence
pub fn revcomp_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' | b'a' => b'T',
            b'T' | b't' => b'A',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            _ => b'N',
        })
        .collect()
}

/// Dangling-end search patterns for one restriction sequence.
///
/// A forward read starting with the dangling sequence, or a reverse read
/// ending with its reverse complement, marks a re-ligation artifact.
#[derive(Debug, Clone)]
pub struct DanglingPatterns {
    pub forward: Vec<u8>,
    pub reverse: Vec<u8>,
}

impl DanglingPatterns {
    pub fn new(dangling_sequence: &str) -> Self {
        let forward = dangling_sequence.to_ascii_uppercase().into_bytes();
        let reverse = revcomp_seq(&forward);
        Self { forward, reverse }
    }
}

/// Check whether a mate carries the dangling-end signature
pub fn check_dangling_end(mate: &MateRecord, patterns: &DanglingPatterns) -> bool {
    if !mate.is_reverse {
        let pat = &patterns.forward;
        mate.seq.len() >= pat.len() && mate.seq[..pat.len()].eq_ignore_ascii_case(pat)
    } else {
        let pat = &patterns.reverse;
        mate.seq.len() >= pat.len()
            && mate.seq[mate.seq.len() - pat.len()..].eq_ignore_ascii_case(pat)
    }
}
