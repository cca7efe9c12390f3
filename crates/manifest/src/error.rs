//! Error types for the manifest crate

use declarative::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing manifests
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest file does not exist
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Extension is not .toml, .json or .rb
    #[error("unsupported manifest format: {} (expected .toml, .json or .rb)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// TOML manifest is malformed
    #[error("invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON manifest is malformed
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// Recipe could not be parsed
    #[error("line {line}: {message}")]
    RecipeParse { line: usize, message: String },

    /// Records parsed but failed validation
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
