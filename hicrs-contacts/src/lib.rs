//! # Contact matrix construction from fragment-end pairs.
//!
//! Each input line holds the two fragment ends of a ligation product
//! (`chrA startA endA chrB startB endB`). Both starts are resolved to genome bins and the pair is
//! counted in a symmetric matrix. Pairs that can't be resolved are counted by reason and dropped.
//!
//! Work is fanned out over a pool of workers, each owning a full-size private matrix, and the
//! partial matrices are summed once every worker has finished.
//!
pub mod accumulator;
pub mod builder;
pub mod config;
pub mod counts;
pub mod pairs;

// re-exports
pub use accumulator::*;
pub use builder::*;
pub use config::*;
pub use counts::*;
pub use pairs::*;
