use std::path::PathBuf;
use thiserror::Error;

/// Failures that can escape a top-level extractor.
///
/// Everything below the file boundary is total: a missing or malformed
/// field is an absent `Option`, never an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unknown server: {0}")]
    UnknownServer(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
