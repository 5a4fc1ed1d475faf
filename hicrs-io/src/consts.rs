/// File name suffix of raw (and region sub-) count matrices.
pub const COUNT_MATRIX_SUFFIX: &str = ".countMatrix.gz";
/// File name suffix of ICE normalized matrices.
pub const NORM_MATRIX_SUFFIX: &str = ".normMatrix.gz";
/// File name suffix of bias vectors.
pub const BIAS_SUFFIX: &str = ".bias.gz";
/// Suffix appended to output paths while they are being written.
pub const PARTIAL_SUFFIX: &str = ".partial";
/// Decimal places of every floating point value written to disk.
pub const FLOAT_PRECISION: usize = 8;
/// File name suffix of the bin partition written next to a raw matrix.
pub const BINS_BED_SUFFIX: &str = ".bins.bed";
/// File name suffix of the pair resolution tally written next to a raw matrix.
pub const PAIR_LOG_SUFFIX: &str = ".pairs.log";
