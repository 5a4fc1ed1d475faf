use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::ThreadPool;
use rayon::prelude::*;

use hicrs_core::models::{ContactMatrix, GenomeBins};
use hicrs_core::utils::check_output_dir;
use hicrs_core::{HicError, Result};
use hicrs_io::{COUNT_MATRIX_SUFFIX, read_matrix, read_matrix_header, write_matrix};

use crate::config::{NormalizationConfig, check_min_count, check_threads};
use crate::ice::{IceResult, normalize_sub_matrix};
use crate::low_bins::{LowBinMasks, combine_region_sums, empty_masks, region_sums};
use crate::regions::RegionIndex;
use crate::sub_matrix::{SubMatrixFile, region_sub_matrix};

///
/// A raw count matrix file and the sample name taken from it.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub path: PathBuf,
}

impl Sample {
    ///
    /// Name a `{sample}.countMatrix.gz` file after its sample.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(COUNT_MATRIX_SUFFIX))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                HicError::Config(format!(
                    "matrix file names must end in {}: {}",
                    COUNT_MATRIX_SUFFIX,
                    path.display()
                ))
            })?;
        Ok(Sample {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn thread_pool(threads: usize) -> Result<ThreadPool> {
    check_threads(threads)?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| HicError::Worker(e.to_string()))
}

///
/// MatrixSet struct, raw count matrices of several samples over one bin partition, and the
/// regions they are normalized over.
///
/// Every stage works on whole files and keeps each output file with a single worker.
///
#[derive(Debug, Clone)]
pub struct MatrixSet {
    samples: Vec<Sample>,
    bins: GenomeBins,
    regions: RegionIndex,
}

impl MatrixSet {
    ///
    /// Check that the matrices share one header and index the regions against its bins.
    ///
    /// # Arguments
    /// - matrix_files: `{sample}.countMatrix.gz` files, one per sample
    /// - region_file: `chromosome  start  end  name` records
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(matrix_files: &[P], region_file: Q) -> Result<Self> {
        if matrix_files.is_empty() {
            return Err(HicError::Config("no count matrix files given".to_string()));
        }

        let samples = matrix_files
            .iter()
            .map(Sample::from_path)
            .collect::<Result<Vec<_>>>()?;
        let mut names = HashSet::new();
        for sample in &samples {
            if !names.insert(sample.name.as_str()) {
                return Err(HicError::Config(format!(
                    "sample {} is given more than once",
                    sample.name
                )));
            }
        }

        let header = read_matrix_header(&samples[0].path)?;
        for sample in &samples[1..] {
            if read_matrix_header(&sample.path)? != header {
                return Err(HicError::format(
                    &sample.path,
                    format!("header differs from {}", samples[0].path.display()),
                ));
            }
        }

        let bins = GenomeBins::from_bin_names(&header, &samples[0].path)?;
        let regions = RegionIndex::from_file(&bins, region_file)?;
        info!(
            "{} samples over {} bins and {} regions",
            samples.len(),
            bins.len(),
            regions.len()
        );

        Ok(MatrixSet {
            samples,
            bins,
            regions,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn bins(&self) -> &GenomeBins {
        &self.bins
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    ///
    /// Find the bins of each region whose intra-region signal is below `min_count` in any sample.
    ///
    /// Samples are summed in parallel, one matrix per worker. With `min_count == 0` no matrix is
    /// read and no bin is flagged.
    ///
    /// # Arguments
    /// - min_count: threshold, must not be negative
    /// - exclude_diagonal: leave self contacts out of the signal
    /// - threads: number of workers
    pub fn low_bins(
        &self,
        min_count: i64,
        exclude_diagonal: bool,
        threads: usize,
    ) -> Result<LowBinMasks> {
        check_min_count(min_count)?;
        if min_count == 0 {
            return Ok(empty_masks(&self.regions));
        }

        let pool = thread_pool(threads)?;
        let per_sample = pool.install(|| {
            self.samples
                .par_iter()
                .map(|sample| {
                    let matrix: ContactMatrix<u32> = read_matrix(&sample.path)?;
                    region_sums(&matrix, &self.regions, exclude_diagonal)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        combine_region_sums(&per_sample, &self.regions, min_count as u64)
    }

    ///
    /// Name the sub-matrix file of every sample and region, grouped by sample.
    ///
    /// Sample and region names may contain dots, so two different pairs can share a file
    /// name (`x.y` with `z` and `x` with `y.z`). Such a plan is rejected before anything is
    /// written.
    fn plan_sub_matrices(
        &self,
        out_dir: &Path,
        config: &NormalizationConfig,
    ) -> Result<Vec<Vec<SubMatrixFile>>> {
        let plan: Vec<Vec<SubMatrixFile>> = self
            .samples
            .iter()
            .map(|sample| {
                self.regions
                    .iter()
                    .map(|(region, _)| {
                        SubMatrixFile::new(
                            out_dir,
                            &sample.name,
                            region,
                            config.min_count,
                            config.exclude_diagonal,
                        )
                    })
                    .collect()
            })
            .collect();

        let mut seen: HashMap<PathBuf, &SubMatrixFile> = HashMap::new();
        for file in plan.iter().flatten() {
            if let Some(first) = seen.insert(file.path(), file) {
                return Err(HicError::Config(format!(
                    "sample {} region {} and sample {} region {} both write {}",
                    first.sample,
                    first.region,
                    file.sample,
                    file.region,
                    file.path().display()
                )));
            }
        }
        Ok(plan)
    }

    ///
    /// Write, for every sample and region, the region sub-matrix with its low bins zeroed.
    ///
    /// # Returns
    /// The written files, grouped by sample in input order, regions sorted by name.
    pub fn save_sub_matrices<P: AsRef<Path>>(
        &self,
        out_dir: P,
        config: &NormalizationConfig,
    ) -> Result<Vec<SubMatrixFile>> {
        let out_dir = out_dir.as_ref();
        config.validate()?;
        check_output_dir(out_dir)?;
        let plan = self.plan_sub_matrices(out_dir, config)?;

        let masks = self.low_bins(config.min_count, config.exclude_diagonal, config.threads)?;

        let pool = thread_pool(config.threads)?;
        pool.install(|| {
            self.samples
                .par_iter()
                .zip(plan.par_iter())
                .map(|(sample, files)| self.save_sample(sample, files, &masks, config))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(plan.into_iter().flatten().collect())
    }

    fn save_sample(
        &self,
        sample: &Sample,
        files: &[SubMatrixFile],
        masks: &LowBinMasks,
        config: &NormalizationConfig,
    ) -> Result<()> {
        let matrix: ContactMatrix<u32> = read_matrix(&sample.path)?;
        matrix.check_symmetric()?;

        for file in files {
            let indices = self
                .regions
                .get(&file.region)
                .ok_or_else(|| HicError::Shape(format!("unknown region {}", file.region)))?;
            let mask = masks.get(&file.region).ok_or_else(|| {
                HicError::Shape(format!("no low bin mask for region {}", file.region))
            })?;
            let sub = region_sub_matrix(&matrix, indices, mask, config.exclude_diagonal)?;
            write_matrix(file.path(), &sub)?;
        }
        Ok(())
    }

    ///
    /// Write the region sub-matrices, then ICE normalize each of them.
    ///
    /// A file that fails to normalize does not stop the others; once all files are done the
    /// first failure is returned.
    ///
    /// # Arguments
    /// - out_dir: existing directory receiving every output file
    /// - config: low bin threshold, diagonal handling, workers and ICE settings
    pub fn ice_normalization<P: AsRef<Path>>(
        &self,
        out_dir: P,
        config: &NormalizationConfig,
    ) -> Result<Vec<(SubMatrixFile, IceResult)>> {
        let files = self.save_sub_matrices(out_dir, config)?;

        let pool = thread_pool(config.threads)?;
        let results: Vec<Result<(SubMatrixFile, IceResult)>> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    normalize_sub_matrix(&file, config.max_iterations, config.min_diff)
                        .map(|result| (file, result))
                })
                .collect()
        });

        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!("ICE normalization failed: {}", error);
        }
        results.into_iter().collect()
    }
}
