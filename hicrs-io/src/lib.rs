//! # Input/Output utilities for contact matrices.
//!
//! Readers and writers for the flat, tab delimited files exchanged with downstream tools:
//! count and normalized matrices (a header of `chr:start-end` bin names followed by one row per
//! bin), bias vectors and bin bed files. Every writer goes through [atomic::write_atomic], so a
//! file only appears under its final name once it is complete.
//!
pub mod atomic;
pub mod bed;
pub mod bias;
pub mod consts;
pub mod matrix;

// re-expose core functions
pub use atomic::*;
pub use bed::*;
pub use bias::*;
pub use consts::*;
pub use matrix::*;
