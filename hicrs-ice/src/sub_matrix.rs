use std::path::{Path, PathBuf};

use hicrs_core::models::ContactMatrix;
use hicrs_core::{HicError, Result};
use hicrs_io::{BIAS_SUFFIX, COUNT_MATRIX_SUFFIX, NORM_MATRIX_SUFFIX};

///
/// Extract a region from a raw matrix with its low bins zeroed on both axes.
///
/// # Arguments
/// - matrix: raw counts over the whole genome
/// - indices: sorted global bin indices of the region
/// - mask: one flag per region bin, `true` for bins to zero
/// - exclude_diagonal: drop self contacts
pub fn region_sub_matrix(
    matrix: &ContactMatrix<u32>,
    indices: &[usize],
    mask: &[bool],
    exclude_diagonal: bool,
) -> Result<ContactMatrix<u32>> {
    if mask.len() != indices.len() {
        return Err(HicError::Shape(format!(
            "low bin mask has {} entries for a region of {} bins",
            mask.len(),
            indices.len()
        )));
    }
    if let Some(&max) = indices.iter().max() {
        if max >= matrix.len() {
            return Err(HicError::Shape(format!(
                "region refers to bin {} but the matrix has {} bins",
                max,
                matrix.len()
            )));
        }
    }

    let mut sub = matrix.sub_matrix(indices);
    if exclude_diagonal {
        sub.zero_diagonal();
    }
    sub.mask_bins(mask);
    Ok(sub)
}

///
/// A written region sub-matrix, and where its normalization outputs go.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SubMatrixFile {
    pub sample: String,
    pub region: String,
    pub min_count: i64,
    pub exclude_diagonal: bool,
    /// Path without suffix, shared by the count, bias and normalized files.
    pub prefix: PathBuf,
}

impl SubMatrixFile {
    ///
    /// Name the sub-matrix of `region` in `sample` inside `out_dir`:
    /// `{sample}.{region}.{min_count}[.noself]`.
    ///
    pub fn new<P: AsRef<Path>>(
        out_dir: P,
        sample: &str,
        region: &str,
        min_count: i64,
        exclude_diagonal: bool,
    ) -> Self {
        let mut stem = format!("{}.{}.{}", sample, region, min_count);
        if exclude_diagonal {
            stem.push_str(".noself");
        }
        SubMatrixFile {
            sample: sample.to_string(),
            region: region.to_string(),
            min_count,
            exclude_diagonal,
            prefix: out_dir.as_ref().join(stem),
        }
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = self.prefix.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    pub fn path(&self) -> PathBuf {
        self.with_suffix(COUNT_MATRIX_SUFFIX)
    }

    pub fn bias_path(&self) -> PathBuf {
        self.with_suffix(BIAS_SUFFIX)
    }

    pub fn norm_path(&self) -> PathBuf {
        self.with_suffix(NORM_MATRIX_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn matrix() -> ContactMatrix<u32> {
        let names = vec!["a:1-5", "a:6-10", "a:11-15", "b:1-5"]
            .into_iter()
            .map(String::from)
            .collect();
        let data = array![[1, 2, 3, 4], [2, 5, 6, 7], [3, 6, 8, 9], [4, 7, 9, 10]];
        ContactMatrix::new(names, data).unwrap()
    }

    #[rstest]
    fn test_region_sub_matrix(matrix: ContactMatrix<u32>) {
        let sub = region_sub_matrix(&matrix, &[0, 2, 3], &[false, true, false], false).unwrap();
        assert_eq!(sub.bin_names, vec!["a:1-5", "a:11-15", "b:1-5"]);
        assert_eq!(sub.data, array![[1, 0, 4], [0, 0, 0], [4, 0, 10]]);
    }

    #[rstest]
    fn test_region_sub_matrix_without_diagonal(matrix: ContactMatrix<u32>) {
        let sub = region_sub_matrix(&matrix, &[0, 1], &[false, false], true).unwrap();
        assert_eq!(sub.data, array![[0, 2], [2, 0]]);
    }

    #[rstest]
    #[case(&[0, 1], &[false])]
    #[case(&[0, 7], &[false, false])]
    fn test_region_sub_matrix_bad_shape(
        matrix: ContactMatrix<u32>,
        #[case] indices: &[usize],
        #[case] mask: &[bool],
    ) {
        let result = region_sub_matrix(&matrix, indices, mask, false);
        assert!(matches!(result, Err(HicError::Shape(_))));
    }

    #[rstest]
    #[case(false, "out/s1.locus.10.countMatrix.gz", "out/s1.locus.10.bias.gz")]
    #[case(true, "out/s1.locus.10.noself.countMatrix.gz", "out/s1.locus.10.noself.bias.gz")]
    fn test_sub_matrix_file_names(
        #[case] exclude_diagonal: bool,
        #[case] matrix_path: &str,
        #[case] bias_path: &str,
    ) {
        let file = SubMatrixFile::new("out", "s1", "locus", 10, exclude_diagonal);
        assert_eq!(file.path(), PathBuf::from(matrix_path));
        assert_eq!(file.bias_path(), PathBuf::from(bias_path));
        assert!(
            file.norm_path()
                .to_str()
                .unwrap()
                .ends_with(".normMatrix.gz")
        );
    }
}
