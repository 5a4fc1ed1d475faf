use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::Path;

use log::debug;

use crate::errors::{HicError, Result};
use crate::models::Bin;
use crate::utils::{get_dynamic_reader, read_chrom_sizes};

///
/// Outcome of resolving a coordinate against the bin partition.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinLookup {
    /// Global index of the bin holding the coordinate
    Resolved(usize),
    /// The chromosome is absent from the index
    NoChromosome,
    /// The chromosome is known but no bin covers the coordinate
    NoBin,
}

/// Sorted bin coordinates of a single chromosome.
#[derive(Debug, Clone, Default)]
struct ChromBins {
    starts: Vec<u32>,
    ends: Vec<u32>,
    indices: Vec<usize>,
}

///
/// GenomeBins struct, an ordered, non-overlapping partition of every chromosome into bins.
///
/// Built once and shared read-only; it answers which bin holds a coordinate and nothing else.
///
#[derive(Debug, Clone)]
pub struct GenomeBins {
    bins: Vec<Bin>,
    chroms: Vec<String>,
    chrom_bins: HashMap<String, ChromBins>,
}

/// Fixed width bins; the remainder is split floor/ceil before the first and after the last bin.
fn fixed_width_bins(length: u32, width: u32) -> Vec<(u32, u32)> {
    let (length, width) = (length as u64, width as u64);
    let remainder = length % width;
    let mut end = remainder / 2 + width;

    let mut bins = Vec::new();
    while end <= length {
        bins.push(((end - width + 1) as u32, end as u32));
        end += width;
    }
    bins
}

/// Bins as equal as possible, summing exactly to the chromosome length.
///
/// `large` sized bins come first, followed by `small` sized bins; the two sizes differ by at
/// most one base.
fn balanced_width_bins(length: u32, width: u32) -> Vec<(u32, u32)> {
    if length == 0 {
        return Vec::new();
    }
    let (length, width) = (length as u64, width as u64);
    let bin_no = length.div_ceil(width);
    let excess = bin_no * width - length;

    let large_bin = width - excess / bin_no;
    let small_bin = width - excess.div_ceil(bin_no);
    let small_bin_no = excess % bin_no;
    let large_bin_no = bin_no - small_bin_no;

    let widths = std::iter::repeat_n(large_bin, large_bin_no as usize)
        .chain(std::iter::repeat_n(small_bin, small_bin_no as usize));

    let mut end = 0u64;
    widths
        .map(|w| {
            end += w;
            ((end - w + 1) as u32, end as u32)
        })
        .collect()
}

impl GenomeBins {
    ///
    /// Partition every chromosome into bins of a nominal width.
    ///
    /// # Arguments
    /// - chrom_sizes: `(chromosome, length)` pairs, in the order bins should be indexed
    /// - width: nominal bin width, must be positive
    /// - fixed_width: every bin exactly `width` long when true, balanced widths otherwise
    pub fn from_chrom_sizes(
        chrom_sizes: &[(String, u32)],
        width: u32,
        fixed_width: bool,
    ) -> Result<Self> {
        if width == 0 {
            return Err(HicError::Config(
                "bin width must be a positive integer".to_string(),
            ));
        }

        let mut bins = Vec::new();
        let mut chroms = Vec::with_capacity(chrom_sizes.len());
        let mut chrom_bins = HashMap::with_capacity(chrom_sizes.len());

        for (chr, length) in chrom_sizes {
            if chrom_bins.contains_key(chr) {
                return Err(HicError::Config(format!(
                    "chromosome {} listed more than once",
                    chr
                )));
            }
            let coords = match fixed_width {
                true => fixed_width_bins(*length, width),
                false => balanced_width_bins(*length, width),
            };

            let mut current = ChromBins::default();
            for (start, end) in coords {
                let index = bins.len();
                current.starts.push(start);
                current.ends.push(end);
                current.indices.push(index);
                bins.push(Bin {
                    chr: chr.clone(),
                    start,
                    end,
                    index,
                });
            }
            chroms.push(chr.clone());
            chrom_bins.insert(chr.clone(), current);
        }

        debug!(
            "Created {} bins over {} chromosomes (width {}, fixed {})",
            bins.len(),
            chroms.len(),
            width,
            fixed_width
        );

        Ok(GenomeBins {
            bins,
            chroms,
            chrom_bins,
        })
    }

    ///
    /// Partition the chromosomes listed in a chromosome sizes file.
    ///
    /// # Arguments
    /// - path: tab separated `chromosome  length` table
    /// - width: nominal bin width
    /// - fixed_width: see [GenomeBins::from_chrom_sizes]
    pub fn from_chrom_sizes_file<P: AsRef<Path>>(
        path: P,
        width: u32,
        fixed_width: bool,
    ) -> Result<Self> {
        let chrom_sizes = read_chrom_sizes(path)?;
        GenomeBins::from_chrom_sizes(&chrom_sizes, width, fixed_width)
    }

    ///
    /// Build the index from an explicit list of bins given in index order.
    ///
    /// Each chromosome's bins must be contiguous in the list, sorted and non-overlapping.
    ///
    /// # Arguments
    /// - coords: `(chromosome, start, end)` for each bin
    /// - source: file the bins came from, used in error messages
    pub fn from_coordinates<P: AsRef<Path>>(
        coords: Vec<(String, u32, u32)>,
        source: P,
    ) -> Result<Self> {
        let source = source.as_ref();

        let mut bins = Vec::with_capacity(coords.len());
        let mut chroms: Vec<String> = Vec::new();
        let mut chrom_bins: HashMap<String, ChromBins> = HashMap::new();

        for (index, (chr, start, end)) in coords.into_iter().enumerate() {
            if start > end {
                return Err(HicError::format(
                    source,
                    format!("bin {}:{}-{} ends before it starts", chr, start, end),
                ));
            }

            let is_new_chrom = chroms.last() != Some(&chr);
            if is_new_chrom && chrom_bins.contains_key(&chr) {
                return Err(HicError::format(
                    source,
                    format!("bins of {} are not contiguous", chr),
                ));
            }
            if is_new_chrom {
                chroms.push(chr.clone());
            }

            let current = chrom_bins.entry(chr.clone()).or_default();
            if let Some(&last_end) = current.ends.last() {
                if start <= last_end {
                    return Err(HicError::format(
                        source,
                        format!(
                            "bin {}:{}-{} overlaps or precedes the previous bin",
                            chr, start, end
                        ),
                    ));
                }
            }
            current.starts.push(start);
            current.ends.push(end);
            current.indices.push(index);
            bins.push(Bin {
                chr,
                start,
                end,
                index,
            });
        }

        Ok(GenomeBins {
            bins,
            chroms,
            chrom_bins,
        })
    }

    ///
    /// Rebuild the index from `chr:start-end` names, e.g. a count matrix header.
    ///
    /// # Arguments
    /// - names: bin names in index order
    /// - source: file the names came from, used in error messages
    pub fn from_bin_names<P: AsRef<Path>>(names: &[String], source: P) -> Result<Self> {
        let coords = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Bin::from_name(name, i)
                    .map(|b| (b.chr, b.start, b.end))
                    .ok_or_else(|| {
                        HicError::format(source.as_ref(), format!("invalid bin name: {}", name))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        GenomeBins::from_coordinates(coords, source)
    }

    ///
    /// Find the global index of the bin holding `position` on `chr`.
    ///
    /// Binary searches the chromosome's sorted bin ends for the first end >= position.
    pub fn find_bin(&self, chr: &str, position: u32) -> BinLookup {
        let Some(chrom) = self.chrom_bins.get(chr) else {
            return BinLookup::NoChromosome;
        };

        let location = chrom.ends.partition_point(|&end| end < position);
        match chrom.starts.get(location) {
            Some(&start) if start <= position => BinLookup::Resolved(chrom.indices[location]),
            _ => BinLookup::NoBin,
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bin> {
        self.bins.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bin> {
        self.bins.iter()
    }

    ///
    /// Chromosomes in index order
    ///
    pub fn chromosomes(&self) -> &[String] {
        &self.chroms
    }

    ///
    /// Bins of a single chromosome, in position order
    ///
    pub fn chrom_bins(&self, chr: &str) -> Option<impl Iterator<Item = &Bin>> {
        self.chrom_bins
            .get(chr)
            .map(|c| c.indices.iter().map(|&i| &self.bins[i]))
    }

    ///
    /// `chr:start-end` names of every bin in index order
    ///
    pub fn bin_names(&self) -> Vec<String> {
        self.bins.iter().map(|b| b.name()).collect()
    }
}

impl TryFrom<&Path> for GenomeBins {
    type Error = HicError;

    ///
    /// Load a bin partition from a three column bed-like file.
    ///
    /// # Arguments:
    /// - value: path to a `chromosome  start  end` table, optionally gzipped
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)?;

        let mut coords = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.trim_end().split('\t').collect();
            if parts.len() != 3 {
                return Err(HicError::format(
                    value,
                    format!(
                        "line {} has {} columns, expected 3",
                        line_no + 1,
                        parts.len()
                    ),
                ));
            }
            let parse = |s: &str| {
                s.parse::<u32>().map_err(|_| {
                    HicError::format(
                        value,
                        format!("line {}: invalid coordinate {}", line_no + 1, s),
                    )
                })
            };
            coords.push((parts[0].to_string(), parse(parts[1])?, parse(parts[2])?));
        }

        GenomeBins::from_coordinates(coords, value)
    }
}

impl<'a> IntoIterator for &'a GenomeBins {
    type Item = &'a Bin;
    type IntoIter = std::slice::Iter<'a, Bin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

impl Display for GenomeBins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GenomeBins with {} bins over {} chromosomes.",
            self.len(),
            self.chroms.len()
        )
    }
}
