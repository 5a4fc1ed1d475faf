use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use hicrs_core::models::{GenomeBins, RegionRecord, read_region_records};
use hicrs_core::{HicError, Result};

///
/// RegionIndex struct, the sorted global bin indices of every named region.
///
/// A bin belongs to a region when it lies entirely inside one of the region's records. Every
/// region holds at least one bin and no bin twice.
///
#[derive(Debug, Clone, PartialEq)]
pub struct RegionIndex {
    regions: BTreeMap<String, Vec<usize>>,
}

impl RegionIndex {
    ///
    /// Collect the bins of each named region.
    ///
    /// # Arguments
    /// - bins: the bin partition the indices refer to
    /// - records: region records; records sharing a name are merged
    /// - source: file the records came from, used in error messages
    pub fn new<P: AsRef<Path>>(
        bins: &GenomeBins,
        records: &[RegionRecord],
        source: P,
    ) -> Result<Self> {
        let mut regions: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for record in records {
            let indices = regions.entry(record.name.clone()).or_default();
            if let Some(chrom_bins) = bins.chrom_bins(&record.chr) {
                indices.extend(
                    chrom_bins
                        .filter(|bin| record.contains(bin))
                        .map(|bin| bin.index),
                );
            }
        }

        for (name, indices) in regions.iter_mut() {
            indices.sort_unstable();
            if indices.is_empty() {
                return Err(HicError::format(
                    source.as_ref(),
                    format!("region {} has no bins", name),
                ));
            }
            if indices.windows(2).any(|w| w[0] == w[1]) {
                return Err(HicError::format(
                    source.as_ref(),
                    format!("region {} has overlapping segments", name),
                ));
            }
            debug!("Region {} spans {} bins", name, indices.len());
        }

        Ok(RegionIndex { regions })
    }

    ///
    /// Read a `chromosome  start  end  name` region file and index it against `bins`.
    ///
    pub fn from_file<P: AsRef<Path>>(bins: &GenomeBins, path: P) -> Result<Self> {
        let records = read_region_records(path.as_ref())?;
        RegionIndex::new(bins, &records, path)
    }

    pub fn get(&self, name: &str) -> Option<&[usize]> {
        self.regions.get(name).map(|v| v.as_slice())
    }

    ///
    /// Regions and their bin indices, ordered by region name
    ///
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<usize>)> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.regions.keys()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    ///
    /// Largest bin index used by any region
    ///
    pub fn max_index(&self) -> Option<usize> {
        self.regions.values().filter_map(|v| v.last().copied()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn bins() -> GenomeBins {
        let sizes = vec![("chr1".to_string(), 20), ("chr2".to_string(), 10)];
        GenomeBins::from_chrom_sizes(&sizes, 5, false).unwrap()
    }

    fn record(chr: &str, start: u32, end: u32, name: &str) -> RegionRecord {
        RegionRecord {
            chr: chr.to_string(),
            start,
            end,
            name: name.to_string(),
        }
    }

    #[rstest]
    fn test_region_indices(bins: GenomeBins) {
        let records = vec![
            record("chr2", 1, 10, "locusA"),
            record("chr1", 6, 15, "locusA"),
            record("chr1", 3, 20, "locusB"),
            record("chrX", 1, 100, "locusB"),
        ];
        let index = RegionIndex::new(&bins, &records, "regions").unwrap();

        assert_eq!(index.get("locusA").unwrap(), &[1, 2, 4, 5]);
        // chr1:1-5 straddles the record start and is left out
        assert_eq!(index.get("locusB").unwrap(), &[1, 2, 3]);
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["locusA", "locusB"]);
        assert_eq!(index.max_index(), Some(5));
    }

    #[rstest]
    fn test_empty_region(bins: GenomeBins) {
        let records = vec![record("chr1", 2, 4, "tiny")];
        let result = RegionIndex::new(&bins, &records, "regions");
        assert!(matches!(result, Err(HicError::Format { .. })));
    }

    #[rstest]
    fn test_duplicate_bins_in_region(bins: GenomeBins) {
        let records = vec![
            record("chr1", 1, 10, "locusA"),
            record("chr1", 6, 20, "locusA"),
        ];
        let result = RegionIndex::new(&bins, &records, "regions");
        match result {
            Err(HicError::Format { msg, .. }) => assert!(msg.contains("overlapping")),
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[rstest]
    fn test_overlap_across_names_is_allowed(bins: GenomeBins) {
        let records = vec![
            record("chr1", 1, 10, "locusA"),
            record("chr1", 6, 20, "locusB"),
        ];
        let index = RegionIndex::new(&bins, &records, "regions").unwrap();
        assert_eq!(index.len(), 2);
    }
}
