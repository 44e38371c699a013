//! Configuration error types (thiserror-based).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a [`HarnessConfig`].
///
/// [`HarnessConfig`]: crate::config::HarnessConfig
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("element count must be at least 1")]
    ZeroElements,

    #[error("unknown shader variant: {0}")]
    UnknownVariant(String),

    #[error("unknown validation mode: {0} (expected auto, on or off)")]
    UnknownValidationMode(String),
}
