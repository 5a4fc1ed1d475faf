//! # Core models for Hi-C contact matrix construction
//!
//! This crate holds the data structures shared by every other hicrs crate: the genome bin
//! partition ([models::GenomeBins]) and its coordinate lookup, labelled contact matrices,
//! region definitions, and the common error type.
//!
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{HicError, Result};
