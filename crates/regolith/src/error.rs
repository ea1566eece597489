//! Error types for Regolith.

use std::path::PathBuf;

use crate::model::TypeTag;

/// Result type alias for Regolith operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while translating between natural and display order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The requested index is beyond the current row count.
    #[error("index {index} is out of range for {len} rows")]
    OutOfRange { index: usize, len: usize },

    /// The permutation length disagrees with the collection's row count,
    /// meaning a structural notification was missed.
    #[error("permutation covers {permutation_len} rows but the collection reports {row_count}")]
    Desynchronized {
        permutation_len: usize,
        row_count: usize,
    },
}

impl IndexError {
    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }
}

/// Errors raised while configuring the active sort keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// The column's declared type has no registered comparator.
    #[error("column {column} has type {type_tag:?}, which has no registered comparator")]
    UnsupportedColumnType { column: usize, type_tag: TypeTag },

    /// The column does not exist in the backing collection.
    #[error("column {column} does not exist")]
    UnknownColumn { column: usize },

    /// More sort keys were requested than the supported sort depth.
    #[error("{requested} sort keys requested, at most {max} are supported")]
    TooManyKeys { requested: usize, max: usize },
}

/// Errors raised while loading a [`ViewConfig`](crate::config::ViewConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The umbrella error type for Regolith operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Index translation error.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Sort configuration error.
    #[error(transparent)]
    Sort(#[from] SortError),

    /// Configuration loading error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
