//! Error types for package manager operations.
//!
//! Errors are categorized to enable smart retry logic and appropriate
//! user feedback. Classification reads the package manager's stderr, since
//! neither apt nor brew report failure kinds through exit codes.

use std::time::Duration;
use thiserror::Error;

/// Categories of package manager errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Package database lock held by another process (transient, retryable)
    Locked,
    /// Package or requested version not found
    NotFound,
    /// Version or dependency conflict
    Conflict,
    /// Permission denied (may need sudo)
    Permission,
    /// Package is already installed
    AlreadyInstalled,
    /// Invocation exceeded its timeout
    Timeout,
    /// Package manager not found or not usable
    ManagerNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked)
    }

    /// Whether this error can be safely ignored (operation already done).
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::AlreadyInstalled)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Locked => "Package database locked",
            Self::NotFound => "Package not found",
            Self::Conflict => "Package conflict",
            Self::Permission => "Permission denied",
            Self::AlreadyInstalled => "Already installed",
            Self::Timeout => "Timed out",
            Self::ManagerNotFound => "Package manager not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and package sources, then try again",
            Self::Locked => "Wait for the other package manager process to finish",
            Self::NotFound => "Verify the package name and version, or refresh package lists",
            Self::Conflict => "Resolve the conflict by removing or pinning conflicting packages",
            Self::Permission => "Run as root or allow sudo in the pantry config",
            Self::AlreadyInstalled => "No action needed - package is already installed",
            Self::Timeout => "Raise --timeout or check for a stuck download",
            Self::ManagerNotFound => "Install apt or Homebrew, or pick another --backend",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during package manager operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (connection, DNS, fetch failures)
    #[error("network error: {message}")]
    Network { message: String },

    /// Another process holds the package database lock
    #[error("package database locked: {message}")]
    Locked { message: String },

    /// Package not found in any configured source
    #[error("package not found: {name}")]
    NotFound { name: String },

    /// Version or dependency conflict
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// Package is already installed
    #[error("already installed: {name}")]
    AlreadyInstalled { name: String },

    /// Invocation exceeded its timeout and was killed
    #[error("{program} timed out after {}s", .after.as_secs())]
    Timeout { program: String, after: Duration },

    /// Package manager is not installed or not found in PATH
    #[error("{0} not found")]
    ManagerNotFound(String),

    /// Process could not be started
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Command execution failed
    #[error("command failed: {message}: {stderr}")]
    CommandFailed { message: String, stderr: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::AlreadyInstalled { .. } => ErrorCategory::AlreadyInstalled,
            Error::Timeout { .. } => ErrorCategory::Timeout,
            Error::ManagerNotFound(_) => ErrorCategory::ManagerNotFound,
            Error::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCategory::ManagerNotFound
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether this error can be safely ignored.
    pub fn is_ignorable(&self) -> bool {
        self.category().is_ignorable()
    }

    /// Create an error from package manager output.
    ///
    /// Analyzes stderr (apt-get and brew wording) to categorize the error.
    pub fn from_output(manager: &str, stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let name = || package_name.unwrap_or("unknown").to_string();

        // Lock contention (apt/dpkg)
        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to acquire the dpkg frontend lock")
            || stderr_lower.contains("unable to lock")
        {
            return Error::Locked {
                message: stderr.trim().to_string(),
            };
        }

        // Not found errors; checked before network so package names never trip it
        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("has no installation candidate")
            || (stderr_lower.contains("version '") && stderr_lower.contains("was not found"))
            || stderr_lower.contains("no available formula")
            || stderr_lower.contains("no formulae found")
            || stderr_lower.contains("no such keg")
        {
            return Error::NotFound { name: name() };
        }

        // Network errors
        if stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("could not resolve")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("curl: (")
            || stderr_lower.contains("failed to download")
            || stderr_lower.contains("sha256 mismatch")
            || stderr_lower.contains("hash sum mismatch")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        // Already installed
        if stderr_lower.contains("is already installed")
            || stderr_lower.contains("already the newest version")
        {
            return Error::AlreadyInstalled { name: name() };
        }

        // Conflicts
        if stderr_lower.contains("unmet dependencies")
            || stderr_lower.contains("held broken packages")
            || stderr_lower.contains("conflicts with")
            || stderr_lower.contains("is a dependency")
        {
            return Error::Conflict {
                message: stderr.trim().to_string(),
            };
        }

        // Permission errors
        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("are you root")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("a password is required")
        {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        // Default to command failed
        Error::CommandFailed {
            message: format!(
                "{manager} command failed{}",
                package_name.map(|n| format!(" for {n}")).unwrap_or_default()
            ),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;
