//! # Region restricted iterative correction of contact matrices.
//!
//! Given raw count matrices from one or more samples and a set of named regions, this crate
//!
//! 1. flags, per region, the bins whose intra-region signal is below a threshold in any sample
//!    ([low_bins]),
//! 2. writes one region sub-matrix per sample with those bins zeroed ([sub_matrix]),
//! 3. estimates a per-bin bias for every sub-matrix by iterative proportional fitting and writes
//!    the bias and the bias corrected matrix ([ice]).
//!
//! [matrix_set::MatrixSet] runs the three steps over a set of `*.countMatrix.gz` files.
//!
pub mod config;
pub mod ice;
pub mod low_bins;
pub mod matrix_set;
pub mod regions;
pub mod sub_matrix;

pub use config::*;
pub use ice::*;
pub use low_bins::*;
pub use matrix_set::*;
pub use regions::*;
pub use sub_matrix::*;
