use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the archive layer and the compression pipeline.
///
/// `InvalidInput`, `Resource`, `WorkerPool`, `Merge` and `Extraction` end an
/// operation.
/// `EntryWrite` only ever describes a single file; the batch records it and
/// moves on.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot allocate {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write entry {name}: {source}")]
    EntryWrite {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to merge archives into {}: {source}", path.display())]
    Merge {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("cannot extract {}: {source}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error: {0}")]
    Format(String),
}

impl Error {
    pub(crate) fn entry(name: impl Into<String>, source: impl Into<Error>) -> Self {
        Error::EntryWrite {
            name: name.into(),
            source: Box::new(source.into()),
        }
    }

    pub(crate) fn merge(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::Merge {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::Extraction {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }
}

/// Shorthand for `Err(Error::Format(..))`.
macro_rules! bail_format {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Format(format!($($arg)*)))
    };
}

pub(crate) use bail_format;

// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;
