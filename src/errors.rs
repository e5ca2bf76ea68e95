//! Typed error taxonomy for smellmap.
//!
//! Aggregation errors are fatal and surface to the top level: an incomplete
//! application model must never be analyzed. Cluster-probe errors and
//! per-analysis failures are contained at their boundaries and never reach
//! this module's fatal variants.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the application config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A parser could not interpret a given artifact.
///
/// Carries the artifact path as the repository-relative path the parser was
/// handed, so the message points at the offending source of truth.
#[derive(Debug, Error)]
#[error("failed to parse {path}: {message}")]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by repository artifact lookup.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid glob pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to walk repository '{repository}'")]
    Walk {
        repository: String,
        #[source]
        source: ignore::Error,
    },
}

/// Errors that abort aggregation.
///
/// `UnknownService` and `UnknownRepository` are configuration errors (a name
/// referenced by config is absent from its registry); `Parse` means an
/// artifact itself could not be interpreted. The distinction is part of the
/// aggregation contract.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("unknown service '{0}' referenced in configuration")]
    UnknownService(String),

    #[error("unknown repository '{0}' referenced in configuration")]
    UnknownRepository(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
