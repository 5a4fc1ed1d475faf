use std::io::{BufRead, Write};
use std::path::Path;

use hicrs_core::utils::get_dynamic_reader;
use hicrs_core::{HicError, Result};

use crate::atomic::write_atomic;
use crate::consts::FLOAT_PRECISION;

///
/// Write a bias vector, one value per line with fixed 8 decimal precision.
///
/// # Arguments
/// - path: output path, gzipped when it ends in `.gz`
/// - bias: one value per bin, in matrix row order
pub fn write_bias<P: AsRef<Path>>(path: P, bias: &[f64]) -> Result<()> {
    write_atomic(path, |w| {
        for value in bias {
            writeln!(w, "{:.*}", FLOAT_PRECISION, value)?;
        }
        Ok(())
    })
}

///
/// Read a bias vector written by [write_bias].
///
pub fn read_bias<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut bias = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let value = line.trim().parse::<f64>().map_err(|_| {
            HicError::format(path, format!("line {}: invalid bias {}", line_no + 1, line))
        })?;
        bias.push(value);
    }
    Ok(bias)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_bias_round_trip_is_rounded() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("sample.bias.gz");

        write_bias(&path, &[1.0, 2.0 / 3.0, 0.123456789]).unwrap();

        assert_eq!(read_bias(&path).unwrap(), vec![1.0, 0.66666667, 0.12345679]);
    }

    #[rstest]
    fn test_read_bias_rejects_garbage() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("sample.bias");
        std::fs::write(&path, "1.0\nnope\n").unwrap();

        assert!(matches!(read_bias(&path), Err(HicError::Format { .. })));
    }
}
