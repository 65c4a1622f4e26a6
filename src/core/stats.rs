//! Run statistics and the textual QC report
//!
//! Every worker fills its own `RunStatistics` and the orchestrator folds them
//! together; merge is plain field-wise addition, so it is commutative and the
//! final tallies do not depend on worker completion order.

use crate::core::mate::DanglingPatterns;
use std::fmt::Write;

/// Counters for every classification outcome of one run (or one worker's
/// share of it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Mate pairs pulled from the input streams
    pub total: u64,
    pub one_mate_unmapped: u64,
    pub one_mate_low_quality: u64,
    pub one_mate_not_unique: u64,
    pub duplicated_pairs: u64,
    /// Dangling-end counts, parallel to the configured restriction sequences
    pub dangling_end: Vec<u64>,
    pub self_circle: u64,
    pub self_ligation: u64,
    pub same_fragment: u64,
    pub mate_not_close_to_rf: u64,
    pub count_inward: u64,
    pub count_outward: u64,
    pub count_left: u64,
    pub count_right: u64,
    pub inter_chromosomal: u64,
    pub short_range: u64,
    pub long_range: u64,
    /// Valid pairs added to the matrix
    pub pair_added: u64,
}

impl RunStatistics {
    pub fn new(restriction_sequence_count: usize) -> Self {
        Self {
            dangling_end: vec![0; restriction_sequence_count],
            ..Self::default()
        }
    }

    /// Field-wise addition of a partial result
    pub fn merge(&mut self, other: &RunStatistics) {
        self.total += other.total;
        self.one_mate_unmapped += other.one_mate_unmapped;
        self.one_mate_low_quality += other.one_mate_low_quality;
        self.one_mate_not_unique += other.one_mate_not_unique;
        self.duplicated_pairs += other.duplicated_pairs;
        if self.dangling_end.len() < other.dangling_end.len() {
            self.dangling_end.resize(other.dangling_end.len(), 0);
        }
        for (mine, theirs) in self.dangling_end.iter_mut().zip(&other.dangling_end) {
            *mine += theirs;
        }
        self.self_circle += other.self_circle;
        self.self_ligation += other.self_ligation;
        self.same_fragment += other.same_fragment;
        self.mate_not_close_to_rf += other.mate_not_close_to_rf;
        self.count_inward += other.count_inward;
        self.count_outward += other.count_outward;
        self.count_left += other.count_left;
        self.count_right += other.count_right;
        self.inter_chromosomal += other.inter_chromosomal;
        self.short_range += other.short_range;
        self.long_range += other.long_range;
        self.pair_added += other.pair_added;
    }

    /// Pairs that survived the unmapped/quality filters
    pub fn mappable_unique_high_quality(&self) -> u64 {
        self.total.saturating_sub(
            self.one_mate_unmapped + self.one_mate_low_quality + self.one_mate_not_unique,
        )
    }
}

/// Zero-safe percentage: a zero denominator reports 0 instead of NaN
fn pct(count: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        100.0 * count as f64 / denominator as f64
    }
}

/// Run parameters echoed into the QC report
pub struct QcContext<'a> {
    pub output_name: &'a str,
    pub min_distance: u64,
    pub max_insert_size: u64,
    pub keep_self_ligation: bool,
    pub restriction_sequences: &'a [String],
    pub dangling_patterns: &'a [DanglingPatterns],
}

impl RunStatistics {
    /// Render the QC log.
    ///
    /// Counts are reported with percentages against three denominators: total
    /// sequenced pairs, mappable-unique-high-quality pairs, and valid pairs.
    pub fn qc_report(&self, ctx: &QcContext) -> String {
        let mut out = String::new();
        let total = self.total;
        let muhq = self.mappable_unique_high_quality();

        writeln!(out, "\nFile\t{}\t\t", ctx.output_name).unwrap();
        writeln!(out, "Sequenced reads\t{}\t\t", total).unwrap();
        writeln!(out, "Min rest. site distance\t{}\t\t", ctx.min_distance).unwrap();
        writeln!(out, "Max library insert size\t{}\t\t", ctx.max_insert_size).unwrap();
        writeln!(out).unwrap();

        writeln!(out, "#\tcount\t(percentage w.r.t. total sequenced reads)").unwrap();
        writeln!(
            out,
            "Pairs mappable, unique and high quality\t{}\t({:.2})",
            muhq,
            pct(muhq, total)
        )
        .unwrap();
        writeln!(
            out,
            "Hi-C contacts\t{}\t({:.2})",
            self.pair_added,
            pct(self.pair_added, total)
        )
        .unwrap();
        writeln!(
            out,
            "One mate unmapped\t{}\t({:.2})",
            self.one_mate_unmapped,
            pct(self.one_mate_unmapped, total)
        )
        .unwrap();
        writeln!(
            out,
            "One mate not unique\t{}\t({:.2})",
            self.one_mate_not_unique,
            pct(self.one_mate_not_unique, total)
        )
        .unwrap();
        writeln!(
            out,
            "Low mapping quality\t{}\t({:.2})",
            self.one_mate_low_quality,
            pct(self.one_mate_low_quality, total)
        )
        .unwrap();

        writeln!(
            out,
            "\n#\tcount\t(percentage w.r.t. mappable, unique and high quality pairs)"
        )
        .unwrap();

        if self.dangling_end.is_empty() {
            writeln!(out, "dangling end\t0\t({:.2})", pct(0, muhq)).unwrap();
        } else {
            for (idx, count) in self.dangling_end.iter().enumerate() {
                let seq = ctx
                    .restriction_sequences
                    .get(idx)
                    .map(String::as_str)
                    .unwrap_or("?");
                let pattern = ctx
                    .dangling_patterns
                    .get(idx)
                    .map(|p| String::from_utf8_lossy(&p.forward).into_owned())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "dangling end {} (restriction sequence {})\t{}\t({:.2})",
                    pattern,
                    seq,
                    count,
                    pct(*count, muhq)
                )
                .unwrap();
            }
        }

        let ligation_msg = if ctx.keep_self_ligation {
            " (not removed)"
        } else {
            " (removed)"
        };
        writeln!(
            out,
            "self ligation{}\t{}\t({:.2})",
            ligation_msg,
            self.self_ligation,
            pct(self.self_ligation, muhq)
        )
        .unwrap();
        writeln!(
            out,
            "One mate not close to rest site\t{}\t({:.2})",
            self.mate_not_close_to_rf,
            pct(self.mate_not_close_to_rf, muhq)
        )
        .unwrap();
        writeln!(
            out,
            "same fragment\t{}\t({:.2})",
            self.same_fragment,
            pct(self.same_fragment, muhq)
        )
        .unwrap();
        writeln!(
            out,
            "self circle\t{}\t({:.2})",
            self.self_circle,
            pct(self.self_circle, muhq)
        )
        .unwrap();
        writeln!(
            out,
            "duplicated pairs\t{}\t({:.2})",
            self.duplicated_pairs,
            pct(self.duplicated_pairs, muhq)
        )
        .unwrap();

        if self.pair_added > 0 {
            let valid = self.pair_added;
            writeln!(out, "\n#\tcount\t(percentage w.r.t. total valid pairs used)").unwrap();
            writeln!(
                out,
                "inter chromosomal\t{}\t({:.2})",
                self.inter_chromosomal,
                pct(self.inter_chromosomal, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Intra short range (< 20kb)\t{}\t({:.2})",
                self.short_range,
                pct(self.short_range, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Intra long range (>= 20kb)\t{}\t({:.2})",
                self.long_range,
                pct(self.long_range, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Read pair type: inward pairs\t{}\t({:.2})",
                self.count_inward,
                pct(self.count_inward, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Read pair type: outward pairs\t{}\t({:.2})",
                self.count_outward,
                pct(self.count_outward, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Read pair type: left pairs\t{}\t({:.2})",
                self.count_left,
                pct(self.count_left, valid)
            )
            .unwrap();
            writeln!(
                out,
                "Read pair type: right pairs\t{}\t({:.2})",
                self.count_right,
                pct(self.count_right, valid)
            )
            .unwrap();
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_fieldwise_addition() {
        let mut a = RunStatistics::new(2);
        a.total = 10;
        a.pair_added = 4;
        a.dangling_end[0] = 1;

        let mut b = RunStatistics::new(2);
        b.total = 5;
        b.pair_added = 2;
        b.dangling_end[0] = 2;
        b.dangling_end[1] = 3;

        a.merge(&b);
        assert_eq!(a.total, 15);
        assert_eq!(a.pair_added, 6);
        assert_eq!(a.dangling_end, vec![3, 3]);
    }

    #[test]
    fn test_merge_commutative() {
        let mut a = RunStatistics::new(1);
        a.total = 7;
        a.self_circle = 2;
        let mut b = RunStatistics::new(1);
        b.total = 3;
        b.self_circle = 1;

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_zero_denominator_reports_zero() {
        assert_eq!(pct(0, 0), 0.0);
        assert_eq!(pct(5, 0), 0.0);

        let stats = RunStatistics::new(0);
        let ctx = QcContext {
            output_name: "out.h5",
            min_distance: 300,
            max_insert_size: 1000,
            keep_self_ligation: false,
            restriction_sequences: &[],
            dangling_patterns: &[],
        };
        // no reads at all: the report must still render without panicking
        let report = stats.qc_report(&ctx);
        assert!(report.contains("Sequenced reads\t0"));
        assert!(report.contains("(0.00)"));
    }

    #[test]
    fn test_report_denominators() {
        let mut stats = RunStatistics::new(1);
        stats.total = 100;
        stats.one_mate_unmapped = 10;
        stats.one_mate_low_quality = 5;
        stats.one_mate_not_unique = 5;
        stats.pair_added = 40;
        stats.inter_chromosomal = 10;
        stats.short_range = 10;
        stats.long_range = 20;
        assert_eq!(stats.mappable_unique_high_quality(), 80);

        let patterns = vec![DanglingPatterns::new("AGCT")];
        let seqs = vec!["AAGCTT".to_string()];
        let ctx = QcContext {
            output_name: "matrix.cool",
            min_distance: 300,
            max_insert_size: 1000,
            keep_self_ligation: true,
            restriction_sequences: &seqs,
            dangling_patterns: &patterns,
        };
        let report = stats.qc_report(&ctx);
        assert!(report.contains("Pairs mappable, unique and high quality\t80\t(80.00)"));
        assert!(report.contains("Hi-C contacts\t40\t(40.00)"));
        assert!(report.contains("dangling end AGCT (restriction sequence AAGCTT)"));
        assert!(report.contains("self ligation (not removed)"));
        assert!(report.contains("inter chromosomal\t10\t(25.00)"));
    }
}
