//! Chromosome sizes table
//!
//! Two-column `chrom\tsize` files (UCSC chrom.sizes convention), used to
//! restrict and reorder the binned genome independently of the BAM header.

use crate::core::{BuildError, Result};
use crate::formats::{next_field, open_maybe_gzip, parse_u64};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse a two-column `chrom\tsize` file.
pub fn read_chrom_sizes<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u64)>> {
    let path = path.as_ref();
    let reader = BufReader::new(open_maybe_gzip(path)?);

    let invalid = |line: usize, message: String| BuildError::InvalidInput {
        format: "chromosome sizes",
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut sizes = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let bytes = line.trim_end().as_bytes();
        if bytes.is_empty() || bytes[0] == b'#' {
            continue;
        }
        let (chrom, rest) = next_field(bytes);
        let (size_field, _) = next_field(rest);
        if chrom.is_empty() || size_field.is_empty() {
            return Err(invalid(lineno, "expected 2 columns: chrom, size".to_string()));
        }
        let size = parse_u64(size_field)
            .ok_or_else(|| invalid(lineno, "size is not a non-negative integer".to_string()))?;
        if size == 0 {
            return Err(invalid(lineno, "chromosome size must be positive".to_string()));
        }
        sizes.push((String::from_utf8_lossy(chrom).into_owned(), size));
    }
    Ok(sizes)
}

/// Keep only the listed chromosomes, in list order.
///
/// Unknown names are rejected so a typo does not silently produce an empty
/// matrix.
pub fn select_chromosomes(
    available: &[(String, u64)],
    requested: &[String],
) -> Result<Vec<(String, u64)>> {
    let mut selected = Vec::with_capacity(requested.len());
    for name in requested {
        match available.iter().find(|(chrom, _)| chrom == name) {
            Some(entry) => selected.push(entry.clone()),
            None => {
                return Err(BuildError::Config(format!(
                    "chromosome '{}' not found in the alignment header",
                    name
                )))
            }
        }
    }
    Ok(selected)
}
