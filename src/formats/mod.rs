//! File format adapters
//!
//! Adapters between external genomic file formats (BAM/SAM/CRAM alignments,
//! restriction-site BED, chrom.sizes tables) and the core pipeline, plus the
//! plain-text output writers.

use crate::core::Result;
use flate2::read::MultiGzDecoder;
use memchr::memchr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[cfg(feature = "bam")]
pub mod bam;
pub mod chrom_sizes;
pub mod export;
pub mod rest_sites;

#[cfg(feature = "bam")]
pub use bam::{BamMateStream, ValidPairWriter};
pub use chrom_sizes::{read_chrom_sizes, select_chromosomes};
pub use export::{write_bins, write_matrix, write_qc_report};
pub use rest_sites::{read_restriction_site_files, read_restriction_sites};

/// Open a file, transparently decompressing gzip by extension
pub(crate) fn open_maybe_gzip(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Split off the next tab-delimited field
pub(crate) fn next_field(rest: &[u8]) -> (&[u8], &[u8]) {
    match memchr(b'\t', rest) {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, &[]),
    }
}

pub(crate) fn parse_u64(field: &[u8]) -> Option<u64> {
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}
