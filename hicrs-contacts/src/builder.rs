use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread::{self, ScopedJoinHandle};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, bounded};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use hicrs_core::models::{ContactMatrix, GenomeBins};
use hicrs_core::utils::get_dynamic_reader;
use hicrs_core::{HicError, Result};
use hicrs_io::{BINS_BED_SUFFIX, BedWrite, COUNT_MATRIX_SUFFIX, PAIR_LOG_SUFFIX, write_matrix};

use crate::accumulator::ContactAccumulator;
use crate::config::BuilderConfig;
use crate::counts::PairCounts;
use crate::pairs::FragmentPair;

/// A run of consecutive input lines, starting at 1-based line `first_line`.
struct LineBatch {
    first_line: usize,
    lines: Vec<String>,
}

fn count_batches(
    bins: &GenomeBins,
    batches: Receiver<LineBatch>,
    source: &Path,
) -> Result<ContactAccumulator> {
    let mut acc = ContactAccumulator::new(bins.len());
    for batch in batches.iter() {
        for (offset, line) in batch.lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let pair = FragmentPair::parse(line, batch.first_line + offset, source)?;
            acc.add_pair(bins, &pair);
        }
    }
    Ok(acc)
}

fn join_worker<T>(handle: ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(HicError::Worker("a matrix worker panicked".to_string())))
}

/// Split the input into batches and queue them; stops early once no worker is listening.
fn feed_batches<R: BufRead>(
    reader: R,
    tx: Sender<LineBatch>,
    batch_size: usize,
    bar: &ProgressBar,
) -> Result<()> {
    let mut first_line = 1;
    let mut lines = Vec::with_capacity(batch_size);

    for (i, line) in reader.lines().enumerate() {
        lines.push(line?);
        if lines.len() == batch_size {
            bar.inc(lines.len() as u64);
            let full = std::mem::replace(&mut lines, Vec::with_capacity(batch_size));
            if tx.send(LineBatch { first_line, lines: full }).is_err() {
                debug!("All matrix workers stopped, no longer reading pairs");
                return Ok(());
            }
            first_line = i + 2;
        }
    }
    if !lines.is_empty() {
        bar.inc(lines.len() as u64);
        let _ = tx.send(LineBatch { first_line, lines });
    }
    Ok(())
}

///
/// Build a symmetric contact count matrix from a stream of fragment-end pairs.
///
/// Lines are handed out in batches to `config.workers()` workers over a bounded queue. Each
/// worker counts into its own full-size matrix; once the input is exhausted every worker is
/// joined and the partial matrices and tallies are summed.
///
/// A failing worker fails the whole build: its error (or panic) is returned after the remaining
/// workers have drained the queue, never a partially merged matrix.
///
/// # Arguments
/// - bins: the bin partition both ends are resolved against
/// - reader: lines of `chrA startA endA chrB startB endB`
/// - source: where the lines come from, named in format errors
/// - config: worker and queue settings
pub fn build_contact_matrix<R: BufRead, P: AsRef<Path>>(
    bins: &GenomeBins,
    reader: R,
    source: P,
    config: &BuilderConfig,
) -> Result<(ContactMatrix<u32>, PairCounts)> {
    let source = source.as_ref();
    config.validate(bins.len())?;
    let workers = config.workers();

    let bar = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} pairs")
    {
        bar.set_style(style);
    }

    let (tx, rx) = bounded::<LineBatch>(config.channel_capacity);

    let (fed, results) = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let rx = rx.clone();
                scope.spawn(move || count_batches(bins, rx, source))
            })
            .collect();
        drop(rx);

        let fed = feed_batches(reader, tx, config.batch_size, &bar);

        let results: Vec<Result<ContactAccumulator>> =
            handles.into_iter().map(join_worker).collect();
        (fed, results)
    });
    bar.finish_and_clear();
    fed?;

    let mut merged: Option<ContactAccumulator> = None;
    for result in results {
        let acc = result?;
        match merged.as_mut() {
            Some(total) => total.merge(&acc),
            None => merged = Some(acc),
        }
    }
    let merged =
        merged.ok_or_else(|| HicError::Worker("no worker returned a matrix".to_string()))?;

    let (matrix, stats) = merged.into_matrix(bins);
    info!("{} ({} workers)", stats, workers);
    Ok((matrix, stats))
}

///
/// Build a contact count matrix from a (optionally gzipped) fragment-end pair file.
///
pub fn build_contact_matrix_from_file<P: AsRef<Path>>(
    bins: &GenomeBins,
    path: P,
    config: &BuilderConfig,
) -> anyhow::Result<(ContactMatrix<u32>, PairCounts)> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)
        .with_context(|| format!("Failed to open fragment pair file: {:?}", path))?;

    let built = build_contact_matrix(bins, reader, path, config)
        .with_context(|| format!("Failed to build contact matrix from {:?}", path))?;
    Ok(built)
}

///
/// Build a contact count matrix from a fragment-end pair file and write it to
/// `{output_prefix}.countMatrix.gz`, along with the bins (`{output_prefix}.bins.bed`) and the
/// pair tally (`{output_prefix}.pairs.log`).
///
/// # Returns
/// The path of the written matrix and the pair tally.
pub fn generate_count_matrix<P: AsRef<Path>>(
    bins: &GenomeBins,
    fragend_file: P,
    output_prefix: &str,
    config: &BuilderConfig,
) -> anyhow::Result<(PathBuf, PairCounts)> {
    let (matrix, stats) = build_contact_matrix_from_file(bins, fragend_file, config)?;

    let output = PathBuf::from(format!("{}{}", output_prefix, COUNT_MATRIX_SUFFIX));
    write_matrix(&output, &matrix)
        .with_context(|| format!("Failed to write count matrix: {:?}", output))?;
    info!("Wrote {}x{} count matrix to {:?}", matrix.len(), matrix.len(), output);

    let bed = format!("{}{}", output_prefix, BINS_BED_SUFFIX);
    bins.write_bed(&bed)
        .with_context(|| format!("Failed to write bins: {:?}", bed))?;
    let log = format!("{}{}", output_prefix, PAIR_LOG_SUFFIX);
    stats
        .write_log(&log)
        .with_context(|| format!("Failed to write pair tally: {:?}", log))?;

    Ok((output, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;
    use std::io::{Cursor, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use hicrs_io::read_matrix;
    use pretty_assertions::assert_eq;
    use rand::prelude::*;
    use rstest::*;

    #[fixture]
    fn bins() -> GenomeBins {
        let sizes = vec![
            ("chr1".to_string(), 1_000),
            ("chr2".to_string(), 700),
            ("chr3".to_string(), 333),
        ];
        GenomeBins::from_chrom_sizes(&sizes, 50, false).unwrap()
    }

    /// Seeded random pair lines, including misses on both reasons.
    fn synthetic_pairs(n: usize) -> String {
        let chroms = ["chr1", "chr2", "chr3", "chrUn"];
        let mut rng = StdRng::seed_from_u64(42);
        let mut out = String::new();
        for _ in 0..n {
            let chr_a = chroms[rng.random_range(0..chroms.len())];
            let pos_a: u32 = rng.random_range(0..1_100);
            let chr_b = chroms[rng.random_range(0..chroms.len())];
            let pos_b: u32 = rng.random_range(0..1_100);
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                chr_a,
                pos_a,
                pos_a + 40,
                chr_b,
                pos_b,
                pos_b + 40
            ));
        }
        out
    }

    fn config(threads: usize) -> BuilderConfig {
        BuilderConfig {
            threads,
            batch_size: 7,
            channel_capacity: 4,
            memory_limit: None,
        }
    }

    #[rstest]
    fn test_build_is_independent_of_worker_count(bins: GenomeBins) {
        let input = synthetic_pairs(5_000);

        let (single, single_stats) =
            build_contact_matrix(&bins, Cursor::new(input.as_bytes()), "pairs.txt", &config(1))
                .unwrap();
        for threads in [2, 3, 9] {
            let (matrix, stats) = build_contact_matrix(
                &bins,
                Cursor::new(input.as_bytes()),
                "pairs.txt",
                &config(threads),
            )
            .unwrap();
            assert_eq!(matrix, single);
            assert_eq!(stats, single_stats);
        }

        assert_eq!(single_stats.total, 5_000);
        assert_eq!(single_stats.accepted + single_stats.rejected(), 5_000);
        assert!(single_stats.no_chromosome > 0);
        assert!(single_stats.no_bin > 0);
    }

    #[rstest]
    fn test_build_is_symmetric(bins: GenomeBins) {
        let input = synthetic_pairs(2_000);
        let (matrix, stats) =
            build_contact_matrix(&bins, Cursor::new(input.as_bytes()), "pairs.txt", &config(4))
                .unwrap();

        assert!(matrix.check_symmetric().is_ok());
        let diagonal: u64 = matrix.data.diag().iter().map(|&v| v as u64).sum();
        let total: u64 = matrix.data.iter().map(|&v| v as u64).sum();
        // off-diagonal pairs are counted twice, same-bin pairs once
        assert_eq!((total - diagonal) / 2 + diagonal, stats.accepted);
    }

    #[rstest]
    fn test_malformed_line_fails_build(bins: GenomeBins) {
        let input = "chr1\t1\t5\tchr1\t3\t8\nchr1\tbad\t5\tchr1\t3\t8\n";
        let result =
            build_contact_matrix(&bins, Cursor::new(input.as_bytes()), "pairs.txt", &config(3));
        match result {
            Err(HicError::Format { path, msg }) => {
                assert_eq!(path, "pairs.txt");
                assert!(msg.contains("line 2"));
            }
            other => panic!("expected a format error, got {:?}", other.map(|(_, s)| s)),
        }
    }

    #[rstest]
    fn test_panicking_worker_fails_build() {
        let result: Result<ContactAccumulator> = thread::scope(|scope| {
            join_worker(scope.spawn(|| -> Result<ContactAccumulator> { panic!("worker crashed") }))
        });
        assert!(matches!(result, Err(HicError::Worker(_))));
    }

    #[rstest]
    fn test_failing_file_is_named_in_error(bins: GenomeBins) {
        let tempdir = tempfile::tempdir().unwrap();
        let pairs = tempdir.path().join("broken.fragPairs");
        std::fs::write(&pairs, "chr1	1	5	chr1
").unwrap();

        let error = build_contact_matrix_from_file(&bins, &pairs, &config(2)).unwrap_err();
        match error.downcast_ref::<HicError>() {
            Some(HicError::Format { path, .. }) => assert!(path.ends_with("broken.fragPairs")),
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[rstest]
    fn test_memory_limit_is_enforced(bins: GenomeBins) {
        let config = BuilderConfig {
            memory_limit: Some(16),
            ..config(2)
        };
        let result = build_contact_matrix(&bins, Cursor::new(&b""[..]), "pairs.txt", &config);
        assert!(matches!(result, Err(HicError::Config(_))));
    }

    #[rstest]
    fn test_generate_count_matrix_from_gz(bins: GenomeBins) {
        let tempdir = tempfile::tempdir().unwrap();
        let pairs = tempdir.path().join("sample.fragPairs.gz");
        let mut encoder = GzEncoder::new(File::create(&pairs).unwrap(), Compression::default());
        encoder.write_all(synthetic_pairs(500).as_bytes()).unwrap();
        encoder.finish().unwrap();

        let prefix = tempdir.path().join("sample");
        let (output, stats) =
            generate_count_matrix(&bins, &pairs, prefix.to_str().unwrap(), &config(2)).unwrap();

        assert!(output.to_str().unwrap().ends_with("sample.countMatrix.gz"));
        let written: ContactMatrix<u32> = read_matrix(&output).unwrap();
        assert_eq!(written.bin_names, bins.bin_names());
        assert_eq!(stats.total, 500);
        assert!(tempdir.path().join("sample.bins.bed").exists());
        assert!(tempdir.path().join("sample.pairs.log").exists());
    }
}
