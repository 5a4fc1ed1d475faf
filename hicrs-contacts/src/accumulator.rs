use ndarray::Array2;

use hicrs_core::models::{BinLookup, ContactMatrix, GenomeBins};

use crate::counts::PairCounts;
use crate::pairs::FragmentPair;

///
/// A private, full-size count matrix and pair tally owned by a single worker.
///
/// Accumulators are merged by addition, so the order in which they are merged never changes
/// the result.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ContactAccumulator {
    counts: Array2<u32>,
    stats: PairCounts,
}

impl ContactAccumulator {
    pub fn new(n_bins: usize) -> Self {
        ContactAccumulator {
            counts: Array2::zeros((n_bins, n_bins)),
            stats: PairCounts::default(),
        }
    }

    ///
    /// Resolve both ends of a pair and count it.
    ///
    /// A pair whose first unresolvable end is on an unknown chromosome (or outside every bin)
    /// is tallied under that reason and dropped. Pairs with both ends in the same bin add one
    /// to the diagonal.
    pub fn add_pair(&mut self, bins: &GenomeBins, pair: &FragmentPair<'_>) -> BinLookup {
        let (i, j) = match (
            bins.find_bin(pair.chr_a, pair.pos_a),
            bins.find_bin(pair.chr_b, pair.pos_b),
        ) {
            (BinLookup::Resolved(i), BinLookup::Resolved(j)) => (i, j),
            (BinLookup::Resolved(_), miss) | (miss, _) => {
                self.stats.record(miss);
                return miss;
            }
        };

        self.counts[[i, j]] += 1;
        if i != j {
            self.counts[[j, i]] += 1;
        }

        let lookup = BinLookup::Resolved(i);
        self.stats.record(lookup);
        lookup
    }

    ///
    /// Fold another worker's matrix and tally into this one.
    ///
    pub fn merge(&mut self, other: &ContactAccumulator) {
        self.counts += &other.counts;
        self.stats += other.stats;
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    pub fn stats(&self) -> PairCounts {
        self.stats
    }

    ///
    /// Label the accumulated counts with the bin names of `bins`.
    ///
    pub fn into_matrix(self, bins: &GenomeBins) -> (ContactMatrix<u32>, PairCounts) {
        let matrix = ContactMatrix {
            bin_names: bins.bin_names(),
            data: self.counts,
        };
        (matrix, self.stats)
    }
}
