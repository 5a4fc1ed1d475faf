use std::io::Write;
use std::path::Path;

use hicrs_core::Result;
use hicrs_core::models::GenomeBins;

use crate::atomic::write_atomic;

pub trait BedWrite {
    ///
    /// Write data to disk as bed file, gzipped when the path ends in `.gz`
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_bed<T: AsRef<Path>>(&self, path: T) -> Result<()>;
}

impl BedWrite for GenomeBins {
    fn write_bed<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        write_atomic(path, |w| {
            for bin in self {
                writeln!(w, "{}", bin.as_string())?;
            }
            Ok(())
        })
    }
}
