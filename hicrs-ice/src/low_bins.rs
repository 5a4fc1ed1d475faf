use std::collections::BTreeMap;

use log::info;

use hicrs_core::models::ContactMatrix;
use hicrs_core::{HicError, Result};

use crate::config::check_min_count;
use crate::regions::RegionIndex;

/// Per region flags, one per region bin, marking bins too sparse to normalize.
pub type LowBinMasks = BTreeMap<String, Vec<bool>>;

/// Per region intra-region signal of every region bin.
pub type RegionSums = BTreeMap<String, Vec<u64>>;

///
/// Sum, for every region bin, its contacts with the other bins of the same region.
///
/// The matrix must be square, symmetric and cover every bin the regions refer to.
///
/// # Arguments
/// - matrix: raw counts over the whole genome
/// - regions: the region bin indices
/// - exclude_diagonal: leave self contacts out of the sums
pub fn region_sums(
    matrix: &ContactMatrix<u32>,
    regions: &RegionIndex,
    exclude_diagonal: bool,
) -> Result<RegionSums> {
    matrix.check_symmetric()?;
    if let Some(max) = regions.max_index() {
        if max >= matrix.len() {
            return Err(HicError::Shape(format!(
                "regions refer to bin {} but the matrix has {} bins",
                max,
                matrix.len()
            )));
        }
    }

    let sums = regions
        .iter()
        .map(|(name, indices)| {
            let mut sub = matrix.sub_matrix(indices);
            if exclude_diagonal {
                sub.zero_diagonal();
            }
            (name.clone(), sub.row_sums())
        })
        .collect();
    Ok(sums)
}

///
/// Flag bins whose minimum signal across all samples is below `min_count`.
///
/// Takes the element-wise minimum of the per-sample sums, so a bin sparse in any single sample
/// is flagged whatever the other samples hold.
///
/// # Arguments
/// - per_sample: output of [region_sums] for each sample
/// - regions: the region bin indices the sums were computed over
/// - min_count: threshold, bins strictly below it are flagged
pub fn combine_region_sums(
    per_sample: &[RegionSums],
    regions: &RegionIndex,
    min_count: u64,
) -> Result<LowBinMasks> {
    let mut masks = LowBinMasks::new();

    for (name, indices) in regions.iter() {
        let mut minimum: Option<Vec<u64>> = None;
        for sums in per_sample {
            let region = sums.get(name).ok_or_else(|| {
                HicError::Shape(format!("no signal computed for region {}", name))
            })?;
            if region.len() != indices.len() {
                return Err(HicError::Shape(format!(
                    "region {} has {} bins but {} sums were computed",
                    name,
                    indices.len(),
                    region.len()
                )));
            }
            minimum = Some(match minimum {
                None => region.clone(),
                Some(current) => current
                    .iter()
                    .zip(region)
                    .map(|(a, b)| *a.min(b))
                    .collect(),
            });
        }

        let mask: Vec<bool> = minimum
            .unwrap_or_else(|| vec![0; indices.len()])
            .iter()
            .map(|&sum| sum < min_count)
            .collect();
        info!(
            "Region {}: {} of {} bins below {}",
            name,
            mask.iter().filter(|low| **low).count(),
            mask.len(),
            min_count
        );
        masks.insert(name.clone(), mask);
    }

    Ok(masks)
}

///
/// Masks with no bin flagged.
///
pub fn empty_masks(regions: &RegionIndex) -> LowBinMasks {
    regions
        .iter()
        .map(|(name, indices)| (name.clone(), vec![false; indices.len()]))
        .collect()
}

///
/// Decide, for each region and across all matrices jointly, which bins are too sparse to trust.
///
/// # Arguments
/// - matrices: raw count matrices, one per sample, over the same bins
/// - regions: the region bin indices
/// - min_count: threshold, must not be negative
/// - exclude_diagonal: leave self contacts out of the signal
pub fn compute_low_bins(
    matrices: &[ContactMatrix<u32>],
    regions: &RegionIndex,
    min_count: i64,
    exclude_diagonal: bool,
) -> Result<LowBinMasks> {
    check_min_count(min_count)?;
    if matrices.is_empty() {
        return Err(HicError::Config(
            "at least one matrix is needed to find low bins".to_string(),
        ));
    }

    let per_sample = matrices
        .iter()
        .map(|matrix| region_sums(matrix, regions, exclude_diagonal))
        .collect::<Result<Vec<_>>>()?;

    combine_region_sums(&per_sample, regions, min_count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use hicrs_core::models::{GenomeBins, RegionRecord};
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn bins() -> GenomeBins {
        let sizes = vec![("chr1".to_string(), 20)];
        GenomeBins::from_chrom_sizes(&sizes, 5, false).unwrap()
    }

    #[fixture]
    fn regions(bins: GenomeBins) -> RegionIndex {
        let records = vec![RegionRecord {
            chr: "chr1".to_string(),
            start: 1,
            end: 15,
            name: "locus".to_string(),
        }];
        RegionIndex::new(&bins, &records, "regions").unwrap()
    }

    fn matrix(data: ndarray::Array2<u32>) -> ContactMatrix<u32> {
        let names = (0..4)
            .map(|i| format!("chr1:{}-{}", i * 5 + 1, i * 5 + 5))
            .collect();
        ContactMatrix::new(names, data).unwrap()
    }

    #[fixture]
    fn dense() -> ContactMatrix<u32> {
        matrix(array![
            [5, 6, 7, 100],
            [6, 5, 8, 100],
            [7, 8, 5, 100],
            [100, 100, 100, 0]
        ])
    }

    #[rstest]
    fn test_sums_are_restricted_to_region(dense: ContactMatrix<u32>, regions: RegionIndex) {
        let sums = region_sums(&dense, &regions, false).unwrap();
        assert_eq!(sums["locus"], vec![18, 19, 20]);

        let sums = region_sums(&dense, &regions, true).unwrap();
        assert_eq!(sums["locus"], vec![13, 14, 15]);
    }

    #[rstest]
    fn test_well_covered_region_has_no_low_bins(dense: ContactMatrix<u32>, regions: RegionIndex) {
        let masks = compute_low_bins(&[dense.clone(), dense], &regions, 13, true).unwrap();
        assert_eq!(masks["locus"], vec![false, false, false]);
    }

    #[rstest]
    fn test_minimum_across_matrices(dense: ContactMatrix<u32>, regions: RegionIndex) {
        // bin 1 has no signal in the second sample
        let sparse = matrix(array![
            [50, 0, 70, 0],
            [0, 0, 0, 0],
            [70, 0, 50, 0],
            [0, 0, 0, 0]
        ]);
        let masks = compute_low_bins(&[dense, sparse], &regions, 1, false).unwrap();
        assert_eq!(masks["locus"], vec![false, true, false]);
    }

    #[rstest]
    fn test_threshold_is_strict(dense: ContactMatrix<u32>, regions: RegionIndex) {
        let masks = compute_low_bins(&[dense], &regions, 19, false).unwrap();
        assert_eq!(masks["locus"], vec![true, false, false]);
    }

    #[rstest]
    fn test_negative_min_count(dense: ContactMatrix<u32>, regions: RegionIndex) {
        let result = compute_low_bins(&[dense], &regions, -1, false);
        assert!(matches!(result, Err(HicError::Config(_))));
    }

    #[rstest]
    fn test_asymmetric_matrix_is_rejected(regions: RegionIndex) {
        let skewed = matrix(array![
            [1, 2, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 1]
        ]);
        let result = compute_low_bins(&[skewed], &regions, 1, false);
        assert!(matches!(result, Err(HicError::Shape(_))));
    }

    #[rstest]
    fn test_mismatched_bookkeeping_is_rejected(regions: RegionIndex) {
        let mut sums = RegionSums::new();
        sums.insert("locus".to_string(), vec![10, 10]);
        let result = combine_region_sums(&[sums], &regions, 1);
        assert!(matches!(result, Err(HicError::Shape(_))));
    }
}
