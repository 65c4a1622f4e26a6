//! End-to-end pipeline tests over synthetic mate streams

use fast_hicbuild::core::{
    fixed_bins, BuildConfig, BuildError, CigarOp, ClassifierConfig, DanglingPatterns, MateRecord,
    MatrixBuilder,
};
use std::cell::Cell;
use std::rc::Rc;

fn record(qname: &str, chrom: &str, pos: u64, is_reverse: bool) -> MateRecord {
    MateRecord {
        qname: qname.to_string(),
        chrom: chrom.to_string(),
        pos,
        is_reverse,
        is_unmapped: false,
        is_secondary: false,
        mapq: 30,
        cigar: vec![CigarOp::Match(50)],
        seq: vec![b'C'; 50],
        aligned_len: 50,
        supplementary_count: 0,
    }
}

fn builder(threads: usize, batch_size: usize) -> MatrixBuilder {
    let chrom_sizes = vec![("chr1".to_string(), 1_000_000), ("chr2".to_string(), 500_000)];
    let bins = fixed_bins(10_000, &chrom_sizes);
    let config = BuildConfig {
        classifier: ClassifierConfig::new(&[], &[], 1000, 15, false, false).unwrap(),
        threads,
        batch_size,
        skip_duplication_check: false,
        test_run_pairs: None,
    };
    MatrixBuilder::new(bins, chrom_sizes, &[], config).unwrap()
}

/// A set of pairs with contacts in both triangles and one duplicate
fn sample_streams() -> (Vec<MateRecord>, Vec<MateRecord>) {
    let mut s1 = Vec::new();
    let mut s2 = Vec::new();
    // three contacts between bins 1 and 50, mates in either order
    s1.push(record("q1", "chr1", 10_000, false));
    s2.push(record("q1", "chr1", 500_000, false));
    s1.push(record("q2", "chr1", 10_020, false));
    s2.push(record("q2", "chr1", 500_020, false));
    s1.push(record("q3", "chr1", 500_040, false));
    s2.push(record("q3", "chr1", 10_040, false));
    // an exact positional duplicate of q1
    s1.push(record("q4", "chr1", 10_000, false));
    s2.push(record("q4", "chr1", 500_000, false));
    // an inter-chromosomal contact
    s1.push(record("q5", "chr1", 20_000, false));
    s2.push(record("q5", "chr2", 30_000, true));
    // an unmapped pair
    let mut lost = record("q6", "", 0, false);
    lost.is_unmapped = true;
    s1.push(lost);
    s2.push(record("q6", "chr1", 40_000, true));
    (s1, s2)
}

#[test]
fn builds_symmetric_matrix_with_filters_applied() {
    let (s1, s2) = sample_streams();
    let output = builder(2, 2)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap();

    assert_eq!(output.stats.total, 6);
    assert_eq!(output.stats.one_mate_unmapped, 1);
    assert_eq!(output.stats.duplicated_pairs, 1);
    assert_eq!(output.stats.pair_added, 4);
    assert_eq!(output.stats.inter_chromosomal, 1);
    assert_eq!(output.stats.long_range, 3);

    // bins 1 and 50 interact 3 times; symmetrization mirrors the entry
    let weight = |row: u32, col: u32| {
        output
            .triplets
            .iter()
            .find(|t| t.row == row && t.col == col)
            .map(|t| t.weight)
            .unwrap_or(0)
    };
    assert_eq!(weight(1, 50), 3);
    assert_eq!(weight(50, 1), 3);
    // chr2:30,000 lands in bin 100 + 3
    assert_eq!(weight(2, 103), 1);
    assert_eq!(weight(103, 2), 1);
}

#[test]
fn worker_count_does_not_change_output() {
    let (s1, s2) = sample_streams();
    let one = builder(1, 2)
        .run(s1.clone().into_iter(), s2.clone().into_iter(), None)
        .unwrap();
    let four = builder(4, 1)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap();

    assert_eq!(one.triplets, four.triplets);
    assert_eq!(one.stats, four.stats);
    assert_eq!(one.bins, four.bins);
}

#[test]
fn ten_unmapped_pairs_are_tallied_and_dropped() {
    let mut s1 = Vec::new();
    let mut s2 = Vec::new();
    for i in 0..10 {
        let qname = format!("q{}", i);
        let mut lost = record(&qname, "", 0, false);
        lost.is_unmapped = true;
        s1.push(lost);
        s2.push(record(&qname, "chr1", 40_000, true));
    }
    let output = builder(2, 4)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap();
    assert_eq!(output.stats.total, 10);
    assert_eq!(output.stats.one_mate_unmapped, 10);
    assert_eq!(output.stats.pair_added, 0);
    assert!(output.triplets.is_empty());
}

#[test]
fn qname_mismatch_aborts_the_run() {
    let s1 = vec![record("q1", "chr1", 10_000, false)];
    let s2 = vec![record("other", "chr1", 500_000, false)];
    let err = builder(1, 10)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap_err();
    assert!(matches!(err, BuildError::InputDesync { .. }));
}

#[test]
fn secondary_records_are_skipped() {
    let mut secondary = record("noise", "chr1", 99_000, false);
    secondary.is_secondary = true;
    let s1 = vec![secondary, record("q1", "chr1", 10_000, false)];
    let s2 = vec![record("q1", "chr1", 500_000, false)];
    let output = builder(1, 10)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap();
    assert_eq!(output.stats.total, 1);
    assert_eq!(output.stats.pair_added, 1);
}

#[test]
fn skip_duplication_check_keeps_duplicates() {
    let chrom_sizes = vec![("chr1".to_string(), 1_000_000)];
    let bins = fixed_bins(10_000, &chrom_sizes);
    let config = BuildConfig {
        classifier: ClassifierConfig::new(&[], &[], 1000, 15, false, false).unwrap(),
        threads: 1,
        batch_size: 10,
        skip_duplication_check: true,
        test_run_pairs: None,
    };
    let builder = MatrixBuilder::new(bins, chrom_sizes, &[], config).unwrap();

    let s1 = vec![
        record("q1", "chr1", 10_000, false),
        record("q2", "chr1", 10_000, false),
    ];
    let s2 = vec![
        record("q1", "chr1", 500_000, false),
        record("q2", "chr1", 500_000, false),
    ];
    let output = builder.run(s1.into_iter(), s2.into_iter(), None).unwrap();
    assert_eq!(output.stats.duplicated_pairs, 0);
    assert_eq!(output.stats.pair_added, 2);
}

#[test]
fn test_run_cap_limits_pairs_read() {
    let chrom_sizes = vec![("chr1".to_string(), 1_000_000)];
    let bins = fixed_bins(10_000, &chrom_sizes);
    let config = BuildConfig {
        classifier: ClassifierConfig::new(&[], &[], 1000, 15, false, false).unwrap(),
        threads: 1,
        batch_size: 1,
        skip_duplication_check: false,
        test_run_pairs: Some(2),
    };
    let builder = MatrixBuilder::new(bins, chrom_sizes, &[], config).unwrap();

    let mut s1 = Vec::new();
    let mut s2 = Vec::new();
    for i in 0..5 {
        let qname = format!("q{}", i);
        s1.push(record(&qname, "chr1", 10_000 + i * 100, false));
        s2.push(record(&qname, "chr1", 500_000 + i * 100, false));
    }
    let output = builder.run(s1.into_iter(), s2.into_iter(), None).unwrap();
    assert_eq!(output.stats.total, 2);
    assert_eq!(output.stats.pair_added, 2);
}

/// Mate source that counts how many records the pipeline pulls from it
struct CountingStream {
    inner: std::vec::IntoIter<MateRecord>,
    pulled: Rc<Cell<usize>>,
}

impl Iterator for CountingStream {
    type Item = MateRecord;

    fn next(&mut self) -> Option<MateRecord> {
        let record = self.inner.next();
        if record.is_some() {
            self.pulled.set(self.pulled.get() + 1);
        }
        record
    }
}

#[test]
fn worker_failure_aborts_without_reading_remaining_input() {
    let chrom_sizes = vec![("chr1".to_string(), 1_000_000)];
    let bins = fixed_bins(10_000, &chrom_sizes);
    // a hand-built config with more dangling patterns than restriction
    // sequences; index 1 has no statistics slot, so the worker fails on it
    let classifier = ClassifierConfig {
        restriction_sequences: vec!["AAGCTT".to_string()],
        dangling_patterns: vec![DanglingPatterns::new("TTTT"), DanglingPatterns::new("AGCT")],
        max_insert_size: 1000,
        min_mapping_quality: 15,
        keep_self_circles: false,
        keep_self_ligation: false,
    };
    let config = BuildConfig {
        classifier,
        threads: 1,
        batch_size: 1,
        skip_duplication_check: true,
        test_run_pairs: None,
    };
    let builder = MatrixBuilder::new(bins, chrom_sizes, &[], config).unwrap();

    // the first pair is a close inward pair whose mate 1 starts with AGCT,
    // tripping the failure; a long tail of good pairs follows
    let mut bad = record("q0", "chr1", 10_000, false);
    bad.seq[..4].copy_from_slice(b"AGCT");
    let mut s1 = vec![bad];
    let mut s2 = vec![record("q0", "chr1", 10_400, true)];
    for i in 1..100 {
        let qname = format!("q{}", i);
        s1.push(record(&qname, "chr1", 10_000 + i * 100, false));
        s2.push(record(&qname, "chr1", 500_000 + i * 100, false));
    }

    let pulled = Rc::new(Cell::new(0));
    let stream1 = CountingStream {
        inner: s1.into_iter(),
        pulled: Rc::clone(&pulled),
    };
    let err = builder
        .run(stream1, s2.into_iter(), None)
        .unwrap_err();
    assert!(matches!(err, BuildError::Worker(_)));
    // only the failing round was read; the tail stayed in the stream
    assert!(
        pulled.get() <= 2,
        "pipeline kept reading after the failure: {} records pulled",
        pulled.get()
    );
}

#[test]
fn coverage_reported_per_bin() {
    let s1 = vec![record("q1", "chr1", 10_000, false)];
    let s2 = vec![record("q1", "chr1", 500_000, false)];
    let output = builder(1, 10)
        .run(s1.into_iter(), s2.into_iter(), None)
        .unwrap();
    assert_eq!(output.bins[1].max_coverage, Some(1));
    assert_eq!(output.bins[50].max_coverage, Some(1));
    assert_eq!(output.bins[0].max_coverage, None);
}
