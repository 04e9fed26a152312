//! Defines the crate-wide [`Error`] type. Every failure in the collection
//! pipeline is fatal: there is no partial-success mode, so each variant carries
//! enough context (source file, page number, pattern) to locate the cause.

use crate::config::ConfigError;
use crate::frontmatter::Error as FrontmatterError;
use crate::permalink::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// The error type returned by user-supplied `transform` and `permalinks`
/// functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a fallible collection operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a build-aborting failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the collection configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Returned when a document's front matter can't be parsed.
    #[error("parsing front matter of `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    /// Returned when a source path doesn't follow a permalink formatter's
    /// naming convention.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Returned when a collection's `transform` function fails.
    #[error("transforming `{}`: {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Returned when a collection's `permalinks` function fails.
    #[error("computing permalink for `{}`: {source}", path.display())]
    Permalink {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Returned when a pagination page fails to render.
    #[error("rendering page {page} (`{path}`) of collection `{collection}`: {message}")]
    Render {
        collection: String,
        page: usize,
        path: String,
        message: String,
    },

    /// Returned when a document or layout fails to render.
    #[error("rendering template `{name}`: {message}")]
    Template { name: String, message: String },

    /// Returned when a source, template, or output file can't be read or
    /// written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Returned when walking a collection's base directory fails.
    #[error("discovering files: {0}")]
    Discover(#[from] walkdir::Error),

    /// Returned when the worker pool for reading sources can't be built.
    #[error("starting worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Wraps an [`std::io::Error`] with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
