//! Error types for k2geo.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for k2geo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The source could not be fetched or read
    #[error("failed to open source: {locator}")]
    SourceUnavailable {
        locator: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed database bytes
    #[error("failed to decode database")]
    Decode(#[from] prost::DecodeError),

    /// No entry for the requested country code
    #[error("country not found: {0}")]
    CountryNotFound(String),

    /// An output file could not be created
    #[error("failed to create output file {}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing an output file failed
    #[error("failed to write output file {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Incomplete positional invocation
    #[error("usage: {0}")]
    Usage(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `SourceUnavailable` error for a locator.
    pub(crate) fn source_unavailable<E>(locator: impl Into<String>, cause: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::SourceUnavailable {
            locator: locator.into(),
            source: cause.into(),
        }
    }
}

/// Result type alias for k2geo operations.
pub type Result<T> = std::result::Result<T, Error>;
