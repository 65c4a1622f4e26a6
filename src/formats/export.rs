//! Plain-text outputs
//!
//! The bins table, the sorted matrix triplets and the QC log are the hand-off
//! surface to downstream tooling; container formats are somebody else's job.

use crate::core::{BinInfo, MatrixTriplet, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write the bin table as BED with the max window coverage in column 4.
///
/// Bins no read ever touched get `nan`, distinguishing them from bins that
/// were covered but never peaked.
pub fn write_bins<P: AsRef<Path>>(path: P, bins: &[BinInfo]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for bin in bins {
        match bin.max_coverage {
            Some(cov) => writeln!(
                out,
                "{}\t{}\t{}\t{}",
                bin.interval.chrom, bin.interval.start, bin.interval.end, cov
            )?,
            None => writeln!(
                out,
                "{}\t{}\t{}\tnan",
                bin.interval.chrom, bin.interval.start, bin.interval.end
            )?,
        }
    }
    out.flush()?;
    Ok(())
}

/// Write the symmetric matrix as `row\tcol\tweight` triplets.
///
/// The triplets arrive sorted from assembly, so the file is directly
/// comparable across runs.
pub fn write_matrix<P: AsRef<Path>>(path: P, triplets: &[MatrixTriplet]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for t in triplets {
        writeln!(out, "{}\t{}\t{}", t.row, t.col, t.weight)?;
    }
    out.flush()?;
    Ok(())
}

/// Write the QC log into `qc_folder/QC.log`, creating the folder if needed.
pub fn write_qc_report<P: AsRef<Path>>(qc_folder: P, report: &str) -> Result<PathBuf> {
    let folder = qc_folder.as_ref();
    fs::create_dir_all(folder)?;
    let path = folder.join("QC.log");
    let mut out = BufWriter::new(File::create(&path)?);
    out.write_all(report.as_bytes())?;
    out.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GenomicInterval;

    #[test]
    fn test_write_bins_with_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bins.bed");
        let bins = vec![
            BinInfo {
                interval: GenomicInterval::new("chr1", 0, 100),
                max_coverage: Some(3),
            },
            BinInfo {
                interval: GenomicInterval::new("chr1", 100, 200),
                max_coverage: None,
            },
        ];
        write_bins(&path, &bins).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "chr1\t0\t100\t3\nchr1\t100\t200\tnan\n");
    }

    #[test]
    fn test_write_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.tsv");
        let triplets = vec![
            MatrixTriplet { row: 0, col: 1, weight: 2 },
            MatrixTriplet { row: 1, col: 0, weight: 2 },
        ];
        write_matrix(&path, &triplets).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "0\t1\t2\n1\t0\t2\n");
    }

    #[test]
    fn test_write_qc_report_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("qc");
        let path = write_qc_report(&folder, "File\tmatrix\t\t\n").unwrap();
        assert!(path.ends_with("QC.log"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("File"));
    }
}
