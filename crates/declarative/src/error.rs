//! Error taxonomy for a provisioning run
//!
//! - [`ManifestError`]: malformed input, fatal before any mutation
//! - [`ProbeError`]: the environment can't be inspected, fatal
//! - [`ExecutionError`]: one action failed, captured into its result

use thiserror::Error;

/// Manifest could not be turned into package specs
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Record has an empty (or all-whitespace) name
    #[error("record {index}: package name is empty")]
    EmptyName { index: usize },

    /// Name that no package manager would accept
    #[error("record {index}: invalid package name {name:?}")]
    InvalidName { index: usize, name: String },

    /// Name declared more than once
    #[error("duplicate package {name:?} (records {first} and {second})")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },

    /// State is not `installed`, `removed` or `pinned:<version>`
    #[error("package {name:?}: unrecognized state {value:?} (expected installed, removed or pinned:<version>)")]
    UnrecognizedState { name: String, value: String },
}

/// Package state could not be queried
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The package manager is missing or unusable
    #[error("package manager unavailable: {0}")]
    Unavailable(String),

    /// The query ran but its answer could not be interpreted
    #[error("failed to query {package}: {message}")]
    Query { package: String, message: String },
}

/// One install/remove invocation failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Invocation exceeded the caller-supplied timeout
    #[error("timeout")]
    Timeout,

    /// The package manager reported failure
    #[error("{0}")]
    Failed(String),
}

impl ExecutionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
