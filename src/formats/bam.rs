//! BAM/SAM/CRAM format adapter
//!
//! Bridges rust-htslib alignment files and the core pipeline: a reader that
//! yields [`MateRecord`]s one at a time, and an optional writer that emits
//! the valid pairs as a properly flagged paired-end BAM.

use crate::core::{
    BuildError, CigarOp, MatePair, MateRecord, MateStream, Result, ValidPairSink,
};
use memchr::memchr_iter;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};
use rust_htslib::bam::{self, Header, HeaderView, Read, Record};
use std::path::Path;

fn cigar_from_htslib(cigar: &Cigar) -> CigarOp {
    match cigar {
        Cigar::Match(n) => CigarOp::Match(*n),
        Cigar::Ins(n) => CigarOp::Insertion(*n),
        Cigar::Del(n) => CigarOp::Deletion(*n),
        Cigar::RefSkip(n) => CigarOp::Skip(*n),
        Cigar::SoftClip(n) => CigarOp::SoftClip(*n),
        Cigar::HardClip(n) => CigarOp::HardClip(*n),
        Cigar::Pad(n) => CigarOp::Padding(*n),
        Cigar::Equal(n) => CigarOp::Equal(*n),
        Cigar::Diff(n) => CigarOp::Diff(*n),
    }
}

fn cigar_to_htslib(op: &CigarOp) -> Cigar {
    match op {
        CigarOp::Match(n) => Cigar::Match(*n),
        CigarOp::Insertion(n) => Cigar::Ins(*n),
        CigarOp::Deletion(n) => Cigar::Del(*n),
        CigarOp::Skip(n) => Cigar::RefSkip(*n),
        CigarOp::SoftClip(n) => Cigar::SoftClip(*n),
        CigarOp::HardClip(n) => Cigar::HardClip(*n),
        CigarOp::Padding(n) => Cigar::Pad(*n),
        CigarOp::Equal(n) => Cigar::Equal(*n),
        CigarOp::Diff(n) => Cigar::Diff(*n),
    }
}

/// Signed template length for a written pair record: mate position minus own
/// position on the same reference, zero for inter-chromosomal pairs.
fn template_insert_size(mate: &MateRecord, other: &MateRecord) -> i64 {
    if mate.chrom == other.chrom {
        other.pos as i64 - mate.pos as i64
    } else {
        0
    }
}

/// Announced supplementary alignments: one semicolon-terminated entry per
/// alignment in the SA tag.
fn supplementary_count(record: &Record) -> usize {
    match record.aux(b"SA") {
        Ok(Aux::String(sa)) => memchr_iter(b';', sa.as_bytes()).count(),
        _ => 0,
    }
}

fn to_mate_record(record: &Record, header: &HeaderView) -> MateRecord {
    let tid = record.tid();
    let chrom = if record.is_unmapped() || tid < 0 {
        String::new()
    } else {
        String::from_utf8_lossy(header.tid2name(tid as u32)).into_owned()
    };
    let cigar_view = record.cigar();
    let pos = record.pos().max(0) as u64;
    let aligned_len = if record.is_unmapped() {
        0
    } else {
        (cigar_view.end_pos().max(0) as u64).saturating_sub(pos)
    };
    let cigar: Vec<CigarOp> = cigar_view.iter().map(cigar_from_htslib).collect();
    let mut seq = record.seq().as_bytes();
    seq.make_ascii_uppercase();

    MateRecord {
        qname: String::from_utf8_lossy(record.qname()).into_owned(),
        chrom,
        pos,
        is_reverse: record.is_reverse(),
        is_unmapped: record.is_unmapped(),
        is_secondary: record.is_secondary(),
        mapq: record.mapq(),
        cigar,
        seq,
        aligned_len,
        supplementary_count: supplementary_count(record),
    }
}

/// Sequential reader over one mate file
pub struct BamMateStream {
    reader: bam::Reader,
    header: HeaderView,
    record: Record,
}

impl BamMateStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = bam::Reader::from_path(path.as_ref())?;
        let header = reader.header().clone();
        Ok(Self {
            reader,
            header,
            record: Record::new(),
        })
    }

    pub fn header(&self) -> &HeaderView {
        &self.header
    }

    /// Reference names and lengths from the BAM header, in header order
    pub fn chrom_sizes(&self) -> Vec<(String, u64)> {
        (0..self.header.target_count())
            .map(|tid| {
                let name = String::from_utf8_lossy(self.header.tid2name(tid)).into_owned();
                let len = self.header.target_len(tid).unwrap_or(0);
                (name, len)
            })
            .collect()
    }
}

impl MateStream for BamMateStream {
    fn next_record(&mut self) -> Result<Option<MateRecord>> {
        match self.reader.read(&mut self.record) {
            Some(result) => {
                result?;
                Ok(Some(to_mate_record(&self.record, &self.header)))
            }
            None => Ok(None),
        }
    }
}

/// Writes each valid pair as two properly paired BAM records
pub struct ValidPairWriter {
    writer: bam::Writer,
    header: HeaderView,
}

impl ValidPairWriter {
    pub fn create<P: AsRef<Path>>(path: P, template: &HeaderView) -> Result<Self> {
        let header = Header::from_template(template);
        let writer = bam::Writer::from_path(path.as_ref(), &header, bam::Format::Bam)?;
        let header = writer.header().clone();
        Ok(Self { writer, header })
    }

    fn build_record(&self, mate: &MateRecord, other: &MateRecord, is_first: bool) -> Result<Record> {
        let tid = self
            .header
            .tid(mate.chrom.as_bytes())
            .ok_or_else(|| BuildError::Config(format!("unknown reference '{}'", mate.chrom)))?;
        let mtid = self
            .header
            .tid(other.chrom.as_bytes())
            .ok_or_else(|| BuildError::Config(format!("unknown reference '{}'", other.chrom)))?;

        let cigar: Vec<Cigar> = mate.cigar.iter().map(cigar_to_htslib).collect();
        let qual = vec![255u8; mate.seq.len()];
        let mut record = Record::new();
        record.set(
            mate.qname.as_bytes(),
            Some(&CigarString(cigar)),
            &mate.seq,
            &qual,
        );
        record.set_tid(tid as i32);
        record.set_pos(mate.pos as i64);
        record.set_mapq(mate.mapq);
        record.set_mtid(mtid as i32);
        record.set_mpos(other.pos as i64);
        record.set_insert_size(template_insert_size(mate, other));

        // paired + first/second-in-pair, plus the strand bits
        let mut flags: u16 = 0x1;
        flags |= if is_first { 0x40 } else { 0x80 };
        if mate.is_reverse {
            flags |= 0x10;
        }
        if other.is_reverse {
            flags |= 0x20;
        }
        record.set_flags(flags);
        Ok(record)
    }
}

impl ValidPairSink for ValidPairWriter {
    fn write_pair(&mut self, pair: &MatePair) -> Result<()> {
        let record1 = self.build_record(&pair.mate1, &pair.mate2, true)?;
        let record2 = self.build_record(&pair.mate2, &pair.mate1, false)?;
        self.writer.write(&record1)?;
        self.writer.write(&record2)?;
        Ok(())
    }
}
