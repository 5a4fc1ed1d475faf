use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};

use hicrs_core::models::{ContactMatrix, check_square_symmetric};
use hicrs_core::{HicError, Result};
use hicrs_io::{read_bias, read_matrix, write_bias, write_matrix};

use crate::config::check_iterations;
use crate::sub_matrix::SubMatrixFile;

///
/// Outcome of iterative correction on one matrix.
///
#[derive(Debug, Clone, PartialEq)]
pub struct IceResult {
    /// One multiplicative bias per bin, in matrix row order.
    pub bias: Vec<f64>,
    /// Number of bins with signal, the total the normalized matrix sums to.
    pub desired_sum: usize,
    pub iterations: usize,
    pub converged: bool,
}

///
/// Estimate per-bin biases by iterative proportional fitting.
///
/// Each iteration divides every cell `M[i][j]` by `delta[i] * delta[j]`, where `delta` are the
/// column sums scaled to a mean of one over the bins with signal. Iteration stops once the summed
/// absolute change of `delta` drops below `min_diff`. The accumulated bias is finally scaled so
/// that dividing the input by `bias[i] * bias[j]` gives a matrix summing to the number of bins
/// with signal.
///
/// Bins without signal keep a correction of one throughout, so a matrix without any signal
/// returns a bias of all ones.
///
/// # Arguments
/// - matrix: square, symmetric, non-negative matrix with low bins already zeroed
/// - max_iterations: upper bound on the number of iterations, at least 100
/// - min_diff: convergence threshold
pub fn ice_bias(matrix: &Array2<f64>, max_iterations: usize, min_diff: f64) -> Result<IceResult> {
    check_iterations(max_iterations, min_diff)?;
    check_square_symmetric(matrix)?;

    let n = matrix.nrows();
    let mut corrected = matrix.clone();
    let desired_sum = corrected
        .sum_axis(Axis(0))
        .iter()
        .filter(|&&s| s > 0.0)
        .count();

    let mut bias = Array1::<f64>::ones(n);
    let mut old_delta = Array1::<f64>::ones(n);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let mut delta = corrected.sum_axis(Axis(0));
        let (total, nonzero) = delta
            .iter()
            .filter(|&&d| d != 0.0)
            .fold((0.0, 0usize), |(total, count), &d| (total + d, count + 1));
        if nonzero > 0 {
            let mean = total / nonzero as f64;
            delta.mapv_inplace(|d| d / mean);
        }
        delta.mapv_inplace(|d| if d == 0.0 { 1.0 } else { d });

        bias *= &delta;
        // a single product per cell keeps the matrix exactly symmetric
        for ((i, j), value) in corrected.indexed_iter_mut() {
            *value /= delta[i] * delta[j];
        }

        let change: f64 = old_delta
            .iter()
            .zip(delta.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();
        if change < min_diff {
            converged = true;
            break;
        }
        old_delta = delta;
    }

    if desired_sum > 0 {
        bias *= (corrected.sum() / desired_sum as f64).sqrt();
    }

    Ok(IceResult {
        bias: bias.to_vec(),
        desired_sum,
        iterations,
        converged,
    })
}

///
/// Divide every cell `M[i][j]` by `bias[i] * bias[j]`.
///
pub fn apply_bias(matrix: &Array2<f64>, bias: &[f64]) -> Result<Array2<f64>> {
    let (m, n) = matrix.dim();
    if m != bias.len() || n != bias.len() {
        return Err(HicError::Shape(format!(
            "bias of length {} does not fit a {}x{} matrix",
            bias.len(),
            m,
            n
        )));
    }
    let mut normalized = matrix.clone();
    for ((i, j), value) in normalized.indexed_iter_mut() {
        *value /= bias[i] * bias[j];
    }
    Ok(normalized)
}

///
/// Normalize one written sub-matrix, writing its bias and normalized matrix next to it.
///
/// The normalized matrix is computed from the raw sub-matrix and the bias as read back from the
/// bias file, so both outputs agree to the written precision.
///
/// # Arguments
/// - file: the sub-matrix to normalize
/// - max_iterations: upper bound on ICE iterations
/// - min_diff: ICE convergence threshold
pub fn normalize_sub_matrix(
    file: &SubMatrixFile,
    max_iterations: usize,
    min_diff: f64,
) -> Result<IceResult> {
    let path = file.path();
    let raw: ContactMatrix<f64> = read_matrix(&path)?;

    let result = ice_bias(&raw.data, max_iterations, min_diff).map_err(|e| match e {
        HicError::Shape(msg) => HicError::Shape(format!("{}: {}", path.display(), msg)),
        e => e,
    })?;
    match result.converged {
        true => info!(
            "{}.{}: converged after {} iterations",
            file.sample, file.region, result.iterations
        ),
        false => warn!(
            "{}.{}: not converged after {} iterations",
            file.sample, file.region, result.iterations
        ),
    }

    write_bias(file.bias_path(), &result.bias)?;
    let bias = read_bias(file.bias_path())?;
    let normalized = ContactMatrix {
        bin_names: raw.bin_names,
        data: apply_bias(&raw.data, &bias)?,
    };
    write_matrix(file.norm_path(), &normalized)?;
    debug!("Wrote {:?}", file.norm_path());

    Ok(result)
}
