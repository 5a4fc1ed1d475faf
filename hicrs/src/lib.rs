//! # hicrs: Hi-C contact matrices from fragment pairs to ICE normalized regions
//!
//! Each stage lives in its own crate and is re-exported here behind a cargo feature:
//!
//! - `core`: genome bins, contact matrices, regions and the shared error type
//! - `io`: matrix, bias and bed readers and writers
//! - `contacts`: the parallel contact matrix builder
//! - `ice`: region low-bin filtering and iterative correction
//!
#[cfg(feature = "core")]
#[doc(inline)]
pub use hicrs_core as core;

#[cfg(feature = "io")]
#[doc(inline)]
pub use hicrs_io as io;

#[cfg(feature = "contacts")]
#[doc(inline)]
pub use hicrs_contacts as contacts;

#[cfg(feature = "ice")]
#[doc(inline)]
pub use hicrs_ice as ice;
