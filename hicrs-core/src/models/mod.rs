pub mod bin;
pub mod contact_matrix;
pub mod genome_bins;
pub mod region;

// re-export for cleaner imports
pub use self::bin::Bin;
pub use self::contact_matrix::{ContactMatrix, check_square_symmetric};
pub use self::genome_bins::{BinLookup, GenomeBins};
pub use self::region::{RegionRecord, read_region_records};
