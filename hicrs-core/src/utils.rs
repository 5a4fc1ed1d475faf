use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{HicError, Result};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| {
        HicError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file {}: {}", path.display(), e),
        ))
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Read a chromosome sizes table, keeping the order of the file.
///
/// # Arguments
///
/// - path: tab separated `chromosome  length` table
///
pub fn read_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<Vec<(String, u32)>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut chrom_sizes = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.trim_end().split('\t').collect();
        if parts.len() != 2 {
            return Err(HicError::format(
                path,
                format!(
                    "line {} has {} columns, expected chromosome and length",
                    line_no + 1,
                    parts.len()
                ),
            ));
        }
        let length = parts[1].parse::<u32>().map_err(|_| {
            HicError::format(
                path,
                format!("line {}: invalid chromosome length {}", line_no + 1, parts[1]),
            )
        })?;
        chrom_sizes.push((parts[0].to_string(), length));
    }

    Ok(chrom_sizes)
}

///
/// Make sure an output directory exists before any worker writes into it.
///
pub fn check_output_dir(path: &Path) -> Result<()> {
    match path.is_dir() {
        true => Ok(()),
        false => Err(HicError::Config(format!(
            "directory {} not found",
            path.display()
        ))),
    }
}
