use std::fmt::{self, Display};

use ndarray::{Array2, Axis};
use num_traits::Zero;

use crate::errors::{HicError, Result};

///
/// ContactMatrix struct, a square matrix of pair counts (or normalized values) indexed by bin on
/// both axes, labelled with the `chr:start-end` name of every bin.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ContactMatrix<T> {
    pub bin_names: Vec<String>,
    pub data: Array2<T>,
}

///
/// Fail unless the matrix is square and equal to its transpose.
///
pub fn check_square_symmetric<T: PartialEq>(data: &Array2<T>) -> Result<()> {
    let (m, n) = data.dim();
    if m != n {
        return Err(HicError::Shape(format!(
            "matrix must have equal number of columns and rows, found {}x{}",
            m, n
        )));
    }
    if *data != data.t() {
        return Err(HicError::Shape("matrix must be symmetrical".to_string()));
    }
    Ok(())
}

impl<T> ContactMatrix<T>
where
    T: Clone + PartialEq + Zero,
{
    ///
    /// Label a square matrix with its bin names.
    ///
    pub fn new(bin_names: Vec<String>, data: Array2<T>) -> Result<Self> {
        let (m, n) = data.dim();
        if m != n || m != bin_names.len() {
            return Err(HicError::Shape(format!(
                "{}x{} matrix does not match {} bin names",
                m,
                n,
                bin_names.len()
            )));
        }
        Ok(ContactMatrix { bin_names, data })
    }

    ///
    /// An all zero matrix over the given bins.
    ///
    pub fn zeros(bin_names: Vec<String>) -> Self {
        let n = bin_names.len();
        ContactMatrix {
            bin_names,
            data: Array2::zeros((n, n)),
        }
    }

    pub fn len(&self) -> usize {
        self.bin_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bin_names.is_empty()
    }

    pub fn check_symmetric(&self) -> Result<()> {
        check_square_symmetric(&self.data)
    }

    ///
    /// Drop self contacts.
    ///
    pub fn zero_diagonal(&mut self) {
        self.data.diag_mut().fill(T::zero());
    }

    ///
    /// Restrict the matrix to the given bins on both axes, keeping their order.
    ///
    /// # Arguments
    /// - indices: global bin indices to keep
    pub fn sub_matrix(&self, indices: &[usize]) -> ContactMatrix<T> {
        let data = self
            .data
            .select(Axis(0), indices)
            .select(Axis(1), indices);
        let bin_names = indices.iter().map(|&i| self.bin_names[i].clone()).collect();
        ContactMatrix { bin_names, data }
    }

    ///
    /// Zero every row and column flagged in `mask`.
    ///
    pub fn mask_bins(&mut self, mask: &[bool]) {
        for (i, _) in mask.iter().enumerate().filter(|(_, low)| **low) {
            self.data.row_mut(i).fill(T::zero());
            self.data.column_mut(i).fill(T::zero());
        }
    }
}

impl ContactMatrix<u32> {
    ///
    /// Per row sums, widened so large matrices can't overflow.
    ///
    pub fn row_sums(&self) -> Vec<u64> {
        self.data
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|&v| v as u64).sum())
            .collect()
    }
}

impl<T> Display for ContactMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContactMatrix over {} bins.", self.bin_names.len())
    }
}
