use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hicrs_core::{HicError, Result};

/// Bytes used by one raw matrix cell.
const CELL_BYTES: u64 = std::mem::size_of::<u32>() as u64;

///
/// Settings of the parallel contact matrix builder.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Threads available to the build, the reader included.
    pub threads: usize,
    /// Lines handed to a worker at a time.
    pub batch_size: usize,
    /// Batches that may wait in the work queue before the reader blocks.
    pub channel_capacity: usize,
    /// Upper bound, in bytes, on the summed size of all worker matrices.
    pub memory_limit: Option<u64>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            threads: 1,
            batch_size: 10_000,
            channel_capacity: 64,
            memory_limit: None,
        }
    }
}

impl BuilderConfig {
    pub fn with_threads(threads: usize) -> Self {
        BuilderConfig {
            threads,
            ..Default::default()
        }
    }

    ///
    /// Number of counting workers: with more than two threads one is left to the reader.
    ///
    pub fn workers(&self) -> usize {
        match self.threads > 2 {
            true => self.threads - 1,
            false => self.threads,
        }
    }

    ///
    /// Check the settings against the size of the bin partition.
    ///
    /// # Arguments
    /// - n_bins: number of bins, each worker holds an `n_bins x n_bins` matrix
    pub fn validate(&self, n_bins: usize) -> Result<()> {
        if self.threads == 0 {
            return Err(HicError::Config(
                "threads must be a positive integer".to_string(),
            ));
        }
        if self.batch_size == 0 || self.channel_capacity == 0 {
            return Err(HicError::Config(
                "batch_size and channel_capacity must be positive integers".to_string(),
            ));
        }
        if let Some(limit) = self.memory_limit {
            let n = n_bins as u64;
            let required = (self.workers() as u64)
                .saturating_mul(n.saturating_mul(n))
                .saturating_mul(CELL_BYTES);
            if required > limit {
                return Err(HicError::Config(format!(
                    "{} workers over {} bins need {} bytes, above the memory limit of {} bytes",
                    self.workers(),
                    n_bins,
                    required,
                    limit
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<&Path> for BuilderConfig {
    type Error = HicError;

    fn try_from(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}
