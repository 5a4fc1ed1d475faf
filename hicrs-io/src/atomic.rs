use std::ffi::OsString;
use std::fs::{File, remove_file, rename};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use log::{debug, warn};

use hicrs_core::Result;

use crate::consts::PARTIAL_SUFFIX;

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn write_to<F>(tmp: &Path, gzipped: bool, write: F) -> std::io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let file = BufWriter::new(File::create(tmp)?);
    match gzipped {
        true => {
            let mut encoder = GzEncoder::new(file, Compression::default());
            write(&mut encoder)?;
            encoder.finish()?.flush()
        }
        false => {
            let mut file = file;
            write(&mut file)?;
            file.flush()
        }
    }
}

///
/// Write a file under a temporary name and move it into place once complete.
///
/// Output is gzipped when `path` ends in `.gz`. On failure the partial file is removed and
/// nothing appears under `path`.
///
/// # Arguments
/// - path: final location of the file
/// - write: closure producing the file content
pub fn write_atomic<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    let tmp = partial_path(path);

    if let Err(e) = write_to(&tmp, gzipped, write) {
        warn!("Failed writing {}: {}", path.display(), e);
        let _ = remove_file(&tmp);
        return Err(e.into());
    }
    rename(&tmp, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use flate2::read::MultiGzDecoder;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_write_atomic_plain() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("nested/out.txt");

        write_atomic(&path, |w| writeln!(w, "done")).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "done\n");
        assert!(!partial_path(&path).exists());
    }

    #[rstest]
    fn test_write_atomic_gz() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("out.txt.gz");

        write_atomic(&path, |w| writeln!(w, "zipped")).unwrap();

        let mut content = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "zipped\n");
    }

    #[rstest]
    fn test_write_atomic_failure_leaves_nothing() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("out.txt");

        let result = write_atomic(&path, |w| {
            writeln!(w, "half")?;
            Err(std::io::Error::other("interrupted"))
        });

        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }
}
