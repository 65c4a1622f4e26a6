//! Performance benchmarks for fast-hicbuild
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fast_hicbuild::core::{
    classify_pair, fixed_bins, process_batch, BinIndex, CigarOp, ClassifierConfig, CoverageLayout,
    GenomicInterval, MatePair, MateRecord, ReadPositionSet, RestrictionIndex, WorkerDeps,
};

fn mate(chrom: &str, pos: u64, is_reverse: bool) -> MateRecord {
    MateRecord {
        qname: "bench".to_string(),
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

fn synthetic_pairs(count: usize) -> Vec<MatePair> {
    (0..count)
        .map(|i| {
            let offset = (i as u64 * 977) % 900_000;
            MatePair {
                mate1: mate("chr1", 10_000 + offset, i % 2 == 0),
                mate2: mate("chr1", 50_000 + (offset * 3) % 900_000, i % 3 == 0),
            }
        })
        .collect()
}

/// Benchmark bin index lookups
fn bench_bin_lookup(c: &mut Criterion) {
    let chrom_sizes = vec![("chr1".to_string(), 250_000_000)];
    let index = BinIndex::new(fixed_bins(10_000, &chrom_sizes));

    c.bench_function("bin_lookup", |b| {
        let mut pos = 0u64;
        b.iter(|| {
            pos = (pos + 7919) % 250_000_000;
            black_box(index.lookup(black_box("chr1"), pos))
        })
    });
}

/// Benchmark duplicate detection
fn bench_dedup(c: &mut Criterion) {
    c.bench_function("dedup_insert", |b| {
        let mut seen = ReadPositionSet::new();
        let mut pos = 0u64;
        b.iter(|| {
            pos += 13;
            black_box(seen.is_duplicated("chr1", pos, "chr1", pos + 500))
        })
    });
}

/// Benchmark single-pair classification
fn bench_classify(c: &mut Criterion) {
    let chrom_sizes = vec![("chr1".to_string(), 250_000_000)];
    let bin_index = BinIndex::new(fixed_bins(10_000, &chrom_sizes));
    let sites: Vec<GenomicInterval> = (0..100_000)
        .map(|i| GenomicInterval::new("chr1", 2_000 * i + 500, 2_000 * i + 506))
        .collect();
    let rf_index = RestrictionIndex::new(&sites);
    let config = ClassifierConfig::new(
        &["AAGCTT".to_string()],
        &["AGCT".to_string()],
        1000,
        15,
        false,
        false,
    )
    .unwrap();
    let pairs = synthetic_pairs(1000);

    c.bench_function("classify_pair", |b| {
        let mut idx = 0;
        b.iter(|| {
            idx = (idx + 1) % pairs.len();
            black_box(classify_pair(
                black_box(&pairs[idx]),
                &bin_index,
                &rf_index,
                &config,
            ))
        })
    });
}

/// Benchmark one full worker batch
fn bench_worker_batch(c: &mut Criterion) {
    let chrom_sizes = vec![("chr1".to_string(), 250_000_000)];
    let bins = fixed_bins(10_000, &chrom_sizes);
    let layout = CoverageLayout::new(&bins);
    let bin_index = BinIndex::new(bins);
    let rf_index = RestrictionIndex::new(&[]);
    let config = ClassifierConfig::new(&[], &[], 1000, 15, false, false).unwrap();
    let deps = WorkerDeps {
        bin_index: &bin_index,
        rf_index: &rf_index,
        config: &config,
        coverage_layout: &layout,
        collect_valid_indices: false,
    };
    let batch = synthetic_pairs(10_000);

    let mut group = c.benchmark_group("worker");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("process_batch_10k", |b| {
        b.iter(|| black_box(process_batch(black_box(&batch), &deps)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_bin_lookup,
    bench_dedup,
    bench_classify,
    bench_worker_batch
);
criterion_main!(benches);
