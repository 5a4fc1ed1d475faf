use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HicError {
    /// Invalid parameters: non-positive widths, negative counts, missing directories.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed bin, region or matrix file.
    #[error("Malformed file {path}: {msg}")]
    Format { path: String, msg: String },

    /// Non-square or asymmetric matrix.
    #[error("Invalid matrix shape: {0}")]
    Shape(String),

    /// A worker panicked or disconnected before handing back its share of work.
    #[error("Worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl HicError {
    pub fn format<P: AsRef<Path>, S: Into<String>>(path: P, msg: S) -> Self {
        HicError::Format {
            path: path.as_ref().display().to_string(),
            msg: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HicError>;
