// src/error.rs

//! Error types for the recipe pipeline
//!
//! One crate-wide error enum covering the pipeline taxonomy. Validation and
//! planning failures are non-retryable and happen before any side effect;
//! retrieval failures may be retried by the caller with backoff. Every fatal
//! error aborts the pipeline at its current stage without publishing a
//! partial artifact.

use thiserror::Error;

/// Result type alias used throughout mortar
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by the recipe pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved configuration cannot be built by this recipe
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// An enabled capability has no implementation in the package catalog
    #[error("dependency '{package}' is unavailable: {reason}")]
    UnavailableDependency { package: String, reason: String },

    /// Source retrieval failed (network or integrity)
    #[error("failed to retrieve '{url}': {reason}")]
    Retrieval { url: String, reason: String },

    /// Retrieved content did not match the checksum declared for the version
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// A patch did not apply cleanly to the working tree
    #[error("patch '{patch}' failed to apply: {reason}")]
    PatchFailed { patch: String, reason: String },

    /// The builder exited non-zero; its diagnostic output is carried verbatim
    #[error("{stage} failed with exit code {code:?}\n{output}")]
    BuildFailed {
        stage: String,
        code: Option<i32>,
        output: String,
    },

    /// The install tree does not match what the recipe declared
    #[error("packaging inconsistency: {0}")]
    PackagingInconsistency(String),

    /// A recipe declaration or stored metadata could not be parsed
    #[error("parse error: {0}")]
    ParseError(String),

    /// Underlying filesystem or lock failure
    #[error("io error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
