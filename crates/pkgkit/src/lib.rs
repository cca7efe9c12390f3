//! # pkgkit
//!
//! System package manager backends for pantry.
//!
//! This crate provides:
//! - apt (`apt-get` + `dpkg-query`) and Homebrew backends
//! - Subprocess execution with per-invocation timeouts
//! - Error categorization from package manager output
//! - Retry with exponential backoff for lock and network errors
//!
//! [`Client`] adapts a backend to [`declarative::PackageManager`].
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::{BackendKind, BackendOptions, Client};
//! use declarative::PackageManager;
//!
//! let client = Client::new(BackendKind::Auto, BackendOptions::default())
//!     .expect("no package manager");
//! let state = client.query("make").expect("probe failed");
//! println!("make: {state}");
//! ```

pub mod backend;
pub mod command;
pub mod error;
pub mod retry;
pub mod types;

pub use backend::{Backend, detect};
pub use error::{Error, ErrorCategory, Result};
pub use types::{BackendKind, BackendOptions, RetryConfig};

use declarative::{ApplyContext, CurrentState, ExecutionError, PackageManager, ProbeError};

/// High-level client wrapping one backend.
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
}

impl Client {
    /// Create a client for `kind`, auto-detecting when asked.
    pub fn new(kind: BackendKind, options: BackendOptions) -> Result<Self> {
        Ok(Self::with_backend(detect(kind, options)?))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy for mutating calls.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn mutate<F>(&self, name: &str, op: F) -> std::result::Result<(), ExecutionError>
    where
        F: FnMut() -> Result<()>,
    {
        match retry::with_retry(&self.retry, Some(&retry::LogCallback), op) {
            Ok(()) => Ok(()),
            Err(e) if e.is_ignorable() => {
                log::debug!("{name}: {e}, treating as success");
                Ok(())
            }
            Err(e) => {
                let category = e.category();
                log::debug!("{name}: {} ({})", category.description(), category.advice());
                Err(into_execution_error(e))
            }
        }
    }
}

fn into_execution_error(err: Error) -> ExecutionError {
    match err {
        Error::Timeout { .. } => ExecutionError::Timeout,
        other => ExecutionError::failed(other.to_string()),
    }
}

fn current_state(version: Option<String>) -> CurrentState {
    match version {
        Some(version) => CurrentState::Installed { version },
        None => CurrentState::Absent,
    }
}

fn into_probe_error(err: Error, package: &str) -> ProbeError {
    match err.category() {
        ErrorCategory::ManagerNotFound | ErrorCategory::Permission => {
            ProbeError::Unavailable(err.to_string())
        }
        _ => ProbeError::Query {
            package: package.to_string(),
            message: err.to_string(),
        },
    }
}

impl PackageManager for Client {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn query(&self, name: &str) -> std::result::Result<CurrentState, ProbeError> {
        self.backend
            .installed_version(name)
            .map(current_state)
            .map_err(|e| into_probe_error(e, name))
    }

    fn query_pinned(
        &self,
        name: &str,
        version: &str,
    ) -> std::result::Result<CurrentState, ProbeError> {
        self.backend
            .installed_pinned(name, version)
            .map(current_state)
            .map_err(|e| into_probe_error(e, name))
    }

    fn install(
        &self,
        name: &str,
        version: Option<&str>,
        ctx: &ApplyContext,
    ) -> std::result::Result<(), ExecutionError> {
        self.mutate(name, || self.backend.install(name, version, ctx.timeout))
    }

    fn remove(&self, name: &str, ctx: &ApplyContext) -> std::result::Result<(), ExecutionError> {
        self.mutate(name, || self.backend.remove(name, ctx.timeout))
    }

    fn needs_privileges(&self) -> bool {
        self.backend.needs_privileges()
    }
}
