use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use ndarray::Array2;
use num_traits::Zero;

use hicrs_core::models::ContactMatrix;
use hicrs_core::utils::get_dynamic_reader;
use hicrs_core::{HicError, Result};

use crate::atomic::write_atomic;
use crate::consts::FLOAT_PRECISION;

///
/// How a single matrix cell is written to disk.
///
pub trait MatrixValue: Copy {
    fn write_value(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl MatrixValue for u32 {
    fn write_value(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self)
    }
}

impl MatrixValue for f64 {
    fn write_value(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{:.*}", FLOAT_PRECISION, self)
    }
}

///
/// Write a labelled matrix: a tab separated header of bin names, then one row per bin.
///
/// Integers are written as is, floats with fixed 8 decimal precision.
///
/// # Arguments
/// - path: output path, gzipped when it ends in `.gz`
/// - matrix: the matrix to write
pub fn write_matrix<T: MatrixValue, P: AsRef<Path>>(
    path: P,
    matrix: &ContactMatrix<T>,
) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "{}", matrix.bin_names.join("\t"))?;
        for row in matrix.data.rows() {
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    w.write_all(b"\t")?;
                }
                value.write_value(w)?;
            }
            w.write_all(b"\n")?;
        }
        Ok(())
    })
}

///
/// Read only the bin name header of a matrix file.
///
pub fn read_matrix_header<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = get_dynamic_reader(path)?;

    let mut header = String::new();
    if reader.read_line(&mut header)? == 0 {
        return Err(HicError::format(path, "empty matrix file"));
    }
    Ok(header.trim_end().split('\t').map(String::from).collect())
}

///
/// Read a labelled matrix written by [write_matrix].
///
/// Fails with a format error when a row length or the number of rows disagrees with the header.
///
/// # Arguments
/// - path: path to the matrix file, optionally gzipped
pub fn read_matrix<T, P>(path: P) -> Result<ContactMatrix<T>>
where
    T: FromStr + Clone + PartialEq + Zero,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(HicError::format(path, "empty matrix file")),
    };
    let bin_names: Vec<String> = header.trim_end().split('\t').map(String::from).collect();
    let n = bin_names.len();

    let mut values: Vec<T> = Vec::with_capacity(n * n);
    let mut rows = 0;
    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        rows += 1;
        let before = values.len();
        for field in line.trim_end().split('\t') {
            let value = field.parse::<T>().map_err(|_| {
                HicError::format(path, format!("row {}: invalid value {}", rows, field))
            })?;
            values.push(value);
        }
        let columns = values.len() - before;
        if columns != n {
            return Err(HicError::format(
                path,
                format!(
                    "row {} has {} columns but the header names {} bins",
                    rows, columns, n
                ),
            ));
        }
    }
    if rows != n {
        return Err(HicError::format(
            path,
            format!("found {} rows but the header names {} bins", rows, n),
        ));
    }

    let data = Array2::from_shape_vec((n, n), values)
        .map_err(|e| HicError::format(path, e.to_string()))?;
    ContactMatrix::new(bin_names, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn counts() -> ContactMatrix<u32> {
        ContactMatrix::new(
            vec!["chr1:1-5".to_string(), "chr1:6-10".to_string()],
            array![[1, 2], [2, 0]],
        )
        .unwrap()
    }

    #[rstest]
    fn test_write_count_matrix(counts: ContactMatrix<u32>) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("sample.countMatrix");

        write_matrix(&path, &counts).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "chr1:1-5\tchr1:6-10\n1\t2\n2\t0\n"
        );
    }

    #[rstest]
    fn test_read_count_matrix_gz(counts: ContactMatrix<u32>) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("sample.countMatrix.gz");

        write_matrix(&path, &counts).unwrap();

        let header = read_matrix_header(&path).unwrap();
        assert_eq!(header, counts.bin_names);
        let loaded: ContactMatrix<u32> = read_matrix(&path).unwrap();
        assert_eq!(loaded, counts);
    }

    #[rstest]
    fn test_write_float_precision() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("sample.normMatrix");
        let matrix = ContactMatrix::new(vec!["chr1:1-5".to_string()], array![[1.0 / 3.0]]).unwrap();

        write_matrix(&path, &matrix).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "chr1:1-5\n0.33333333\n"
        );
    }

    #[rstest]
    #[case("a\tb\n1\t2\n2\n")]
    #[case("a\tb\n1\t2\n")]
    #[case("a\tb\n1\t2\n2\tx\n")]
    #[case("")]
    fn test_read_malformed_matrix(#[case] content: &str) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("bad.countMatrix");
        std::fs::write(&path, content).unwrap();

        let result: Result<ContactMatrix<u32>> = read_matrix(&path);
        assert!(matches!(result, Err(HicError::Format { .. })));
    }
}
