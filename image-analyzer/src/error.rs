use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Every pixel sums to at most the threshold.
    #[error("{path} has no pixel brighter than the threshold {threshold}")]
    Blank { path: PathBuf, threshold: u16 },

    #[error("directory {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}
