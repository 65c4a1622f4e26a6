//! Restriction site BED parser
//!
//! Reads the cut-site intervals produced by an in-silico digest (plain or
//! gzip-compressed BED). Only the first three columns are used; extra columns
//! and browser/track/comment lines are ignored. Sites are returned grouped by
//! chromosome in order of first appearance and sorted by start within each
//! chromosome, which is the order the binning and interval-index code expect.

use crate::core::{BuildError, GenomicInterval, Result};
use crate::formats::{next_field, open_maybe_gzip, parse_u64};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse a restriction-site BED file into sorted intervals.
pub fn read_restriction_sites<P: AsRef<Path>>(path: P) -> Result<Vec<GenomicInterval>> {
    let mut sites = parse_bed_file(path.as_ref())?;
    sort_by_appearance(&mut sites);
    Ok(sites)
}

/// Parse several restriction-site BED files (one per enzyme in a multiple
/// digest) into one sorted interval list.
pub fn read_restriction_site_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<GenomicInterval>> {
    let mut sites = Vec::new();
    for path in paths {
        sites.extend(parse_bed_file(path.as_ref())?);
    }
    sort_by_appearance(&mut sites);
    Ok(sites)
}

fn parse_bed_file(path: &Path) -> Result<Vec<GenomicInterval>> {
    let reader = BufReader::new(open_maybe_gzip(path)?);

    let invalid = |line: usize, message: String| BuildError::InvalidInput {
        format: "BED",
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut sites: Vec<GenomicInterval> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let bytes = line.trim_end().as_bytes();
        if bytes.is_empty()
            || bytes[0] == b'#'
            || bytes.starts_with(b"track")
            || bytes.starts_with(b"browser")
        {
            continue;
        }

        let (chrom, rest) = next_field(bytes);
        let (start_field, rest) = next_field(rest);
        let (end_field, _) = next_field(rest);
        if chrom.is_empty() || start_field.is_empty() || end_field.is_empty() {
            return Err(invalid(lineno, "expected 3 columns: chrom, start, end".to_string()));
        }
        let start = parse_u64(start_field)
            .ok_or_else(|| invalid(lineno, "start is not a non-negative integer".to_string()))?;
        let end = parse_u64(end_field)
            .ok_or_else(|| invalid(lineno, "end is not a non-negative integer".to_string()))?;
        if end <= start {
            return Err(invalid(lineno, format!("end {} <= start {}", end, start)));
        }

        sites.push(GenomicInterval::new(
            String::from_utf8_lossy(chrom).into_owned(),
            start,
            end,
        ));
    }
    Ok(sites)
}

/// Group by chromosome appearance order, sort by start within each
fn sort_by_appearance(sites: &mut [GenomicInterval]) {
    let mut rank: HashMap<String, usize> = HashMap::new();
    for site in sites.iter() {
        let next = rank.len();
        rank.entry(site.chrom.clone()).or_insert(next);
    }
    sites.sort_by(|a, b| {
        (rank[&a.chrom], a.start, a.end).cmp(&(rank[&b.chrom], b.start, b.end))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_restriction_sites() {
        let file = write_temp("# digest of hg19 with HindIII\nchr1\t10\t16\nchr1\t100\t106\nchr2\t50\t56\n");
        let sites = read_restriction_sites(file.path()).unwrap();
        assert_eq!(
            sites,
            vec![
                GenomicInterval::new("chr1", 10, 16),
                GenomicInterval::new("chr1", 100, 106),
                GenomicInterval::new("chr2", 50, 56),
            ]
        );
    }

    #[test]
    fn test_sites_sorted_within_chromosome() {
        let file = write_temp("chr1\t100\t106\nchr1\t10\t16\n");
        let sites = read_restriction_sites(file.path()).unwrap();
        assert_eq!(sites[0].start, 10);
        assert_eq!(sites[1].start, 100);
    }

    #[test]
    fn test_multiple_cut_files_merge_into_one_sorted_list() {
        // a double digest: one file per enzyme, interleaved positions
        let hindiii = write_temp("chr1\t100\t106\nchr2\t50\t56\n");
        let dpnii = write_temp("chr1\t10\t14\nchr2\t80\t84\n");
        let sites =
            read_restriction_site_files(&[hindiii.path(), dpnii.path()]).unwrap();
        assert_eq!(
            sites,
            vec![
                GenomicInterval::new("chr1", 10, 14),
                GenomicInterval::new("chr1", 100, 106),
                GenomicInterval::new("chr2", 50, 56),
                GenomicInterval::new("chr2", 80, 84),
            ]
        );
    }

    #[test]
    fn test_bad_bed_line_reports_position() {
        let file = write_temp("chr1\t10\t16\nchr1\tnope\t20\n");
        let err = read_restriction_sites(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let file = write_temp("chr1\t20\t10\n");
        assert!(read_restriction_sites(file.path()).is_err());
    }

    #[test]
    fn test_gzip_input() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.bed.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"chr1\t10\t16\n").unwrap();
        encoder.finish().unwrap();

        let sites = read_restriction_sites(&path).unwrap();
        assert_eq!(sites, vec![GenomicInterval::new("chr1", 10, 16)]);
    }
}
