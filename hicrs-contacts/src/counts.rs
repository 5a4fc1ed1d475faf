use std::fmt::{self, Display};
use std::io::Write;
use std::ops::{Add, AddAssign};
use std::path::Path;

use hicrs_core::Result;
use hicrs_core::models::BinLookup;
use hicrs_io::write_atomic;

///
/// Tally of fragment pairs seen by a worker.
///
/// Each worker owns its own tally; tallies are summed when workers are joined.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCounts {
    pub total: u64,
    pub no_chromosome: u64,
    pub no_bin: u64,
    pub accepted: u64,
}

impl PairCounts {
    ///
    /// Record how one pair resolved.
    ///
    pub fn record(&mut self, lookup: BinLookup) {
        self.total += 1;
        match lookup {
            BinLookup::NoChromosome => self.no_chromosome += 1,
            BinLookup::NoBin => self.no_bin += 1,
            BinLookup::Resolved(_) => self.accepted += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.no_chromosome + self.no_bin
    }

    ///
    /// Write the tally as a two column `name  count` table.
    ///
    pub fn write_log<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomic(path, |w| {
            writeln!(w, "total\t{}", self.total)?;
            writeln!(w, "no_chromosome\t{}", self.no_chromosome)?;
            writeln!(w, "no_bin\t{}", self.no_bin)?;
            writeln!(w, "accepted\t{}", self.accepted)
        })
    }
}

impl AddAssign for PairCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.no_chromosome += other.no_chromosome;
        self.no_bin += other.no_bin;
        self.accepted += other.accepted;
    }
}

impl Add for PairCounts {
    type Output = PairCounts;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Display for PairCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairs: {} accepted, {} on unknown chromosomes, {} outside bins",
            self.total, self.accepted, self.no_chromosome, self.no_bin
        )
    }
}
