use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::Path;

use crate::errors::{HicError, Result};
use crate::models::Bin;
use crate::utils::get_dynamic_reader;

///
/// RegionRecord struct, one line of a region definition file.
///
/// Several records may share a name; together they define one region.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct RegionRecord {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub name: String,
}

impl RegionRecord {
    ///
    /// True when the bin lies entirely inside the record
    ///
    pub fn contains(&self, bin: &Bin) -> bool {
        bin.chr == self.chr && bin.start >= self.start && bin.end <= self.end
    }
}

impl Display for RegionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.chr, self.start, self.end, self.name)
    }
}

///
/// Read a tab separated `chromosome  start  end  name` region file.
///
/// # Arguments
/// - path: path to the region file, optionally gzipped
pub fn read_region_records<P: AsRef<Path>>(path: P) -> Result<Vec<RegionRecord>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.trim_end().split('\t').collect();
        if parts.len() != 4 {
            return Err(HicError::format(
                path,
                format!(
                    "line {} has {} columns, expected chromosome, start, end and name",
                    line_no + 1,
                    parts.len()
                ),
            ));
        }
        let parse = |s: &str| {
            s.parse::<u32>().map_err(|_| {
                HicError::format(path, format!("line {}: invalid coordinate {}", line_no + 1, s))
            })
        };
        records.push(RegionRecord {
            chr: parts[0].to_string(),
            start: parse(parts[1])?,
            end: parse(parts[2])?,
            name: parts[3].to_string(),
        });
    }

    Ok(records)
}
