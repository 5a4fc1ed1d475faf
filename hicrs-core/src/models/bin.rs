use std::fmt::{self, Display};

///
/// Bin struct, one contiguous genomic interval of the genome partition.
///
/// Coordinates are 1-based and closed: the bin covers `start..=end`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Bin {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub index: usize,
}

impl Bin {
    ///
    /// Number of bases covered by the bin
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start + 1
    }

    ///
    /// Bin name as it appears in matrix headers: `chr:start-end`
    ///
    pub fn name(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }

    ///
    /// Get bed line of the bin
    ///
    pub fn as_string(&self) -> String {
        format!("{}\t{}\t{}", self.chr, self.start, self.end)
    }

    ///
    /// Parse a `chr:start-end` header name back into a bin.
    ///
    /// # Arguments
    /// - name: the bin name
    /// - index: global index to assign to the parsed bin
    pub fn from_name(name: &str, index: usize) -> Option<Bin> {
        let (chr, interval) = name.rsplit_once(':')?;
        let (start, end) = interval.split_once('-')?;
        if chr.is_empty() {
            return None;
        }
        Some(Bin {
            chr: chr.to_string(),
            start: start.parse().ok()?,
            end: end.parse().ok()?,
            index,
        })
    }
}

impl Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
