use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hicrs_core::{HicError, Result};

/// Fewest iterations ICE may be configured with.
pub const MIN_ICE_ITERATIONS: usize = 100;

fn default_threads() -> usize {
    1
}

fn default_max_iterations() -> usize {
    1000
}

fn default_min_diff() -> f64 {
    1e-12
}

///
/// Settings of the low-bin filter and ICE normalization.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NormalizationConfig {
    /// Bins whose intra-region signal is below this in any sample are zeroed.
    pub min_count: i64,
    /// Ignore self contacts when summing signal and in the written sub-matrices.
    #[serde(default)]
    pub exclude_diagonal: bool,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on the summed change of the per-iteration correction.
    #[serde(default = "default_min_diff")]
    pub min_diff: f64,
}

impl NormalizationConfig {
    pub fn new(min_count: i64) -> Self {
        NormalizationConfig {
            min_count,
            exclude_diagonal: false,
            threads: default_threads(),
            max_iterations: default_max_iterations(),
            min_diff: default_min_diff(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_min_count(self.min_count)?;
        check_threads(self.threads)?;
        check_iterations(self.max_iterations, self.min_diff)
    }
}

pub(crate) fn check_min_count(min_count: i64) -> Result<()> {
    match min_count < 0 {
        true => Err(HicError::Config(format!(
            "min_count must be a non-negative integer, got {}",
            min_count
        ))),
        false => Ok(()),
    }
}

pub(crate) fn check_threads(threads: usize) -> Result<()> {
    match threads == 0 {
        true => Err(HicError::Config(
            "threads must be a positive integer".to_string(),
        )),
        false => Ok(()),
    }
}

pub(crate) fn check_iterations(max_iterations: usize, min_diff: f64) -> Result<()> {
    if max_iterations < MIN_ICE_ITERATIONS {
        return Err(HicError::Config(format!(
            "max_iterations must be at least {}, got {}",
            MIN_ICE_ITERATIONS, max_iterations
        )));
    }
    if !min_diff.is_finite() || min_diff < 0.0 {
        return Err(HicError::Config(format!(
            "min_diff must be a finite, non-negative number, got {}",
            min_diff
        )));
    }
    Ok(())
}

impl TryFrom<&Path> for NormalizationConfig {
    type Error = HicError;

    fn try_from(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)?;
        let config: NormalizationConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
