//! Backend abstraction over system package managers.
//!
//! The [`Backend`] trait is the narrow surface pantry needs from a package
//! manager, allowing for different implementations (apt, brew, mocks for
//! testing).

pub mod apt;
pub mod brew;

use crate::error::{Error, Result};
use crate::types::{BackendKind, BackendOptions};
use std::time::Duration;

/// Backend trait for package manager operations.
pub trait Backend: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Check if the package manager can be invoked.
    fn is_available(&self) -> bool;

    /// Installed version of a package, `None` when not installed.
    fn installed_version(&self, name: &str) -> Result<Option<String>>;

    /// Installed version for a package pinned to `version`.
    fn installed_pinned(&self, name: &str, _version: &str) -> Result<Option<String>> {
        self.installed_version(name)
    }

    /// Install a package, optionally at an exact version.
    fn install(&self, name: &str, version: Option<&str>, timeout: Option<Duration>) -> Result<()>;

    /// Remove a package.
    fn remove(&self, name: &str, timeout: Option<Duration>) -> Result<()>;

    /// Whether mutating commands need root.
    fn needs_privileges(&self) -> bool {
        false
    }
}

/// Build the backend for `kind`, probing the system when `Auto`.
///
/// A backend is only returned if its tool actually runs.
pub fn detect(kind: BackendKind, options: BackendOptions) -> Result<Box<dyn Backend>> {
    match kind {
        BackendKind::Apt => usable(Box::new(apt::AptBackend::new(options)?)),
        BackendKind::Brew => usable(Box::new(brew::BrewBackend::new()?)),
        BackendKind::Auto => {
            let candidates = [
                apt::AptBackend::new(options).map(|b| Box::new(b) as Box<dyn Backend>),
                brew::BrewBackend::new().map(|b| Box::new(b) as Box<dyn Backend>),
            ];
            pick_first(candidates).ok_or_else(|| {
                Error::ManagerNotFound("no supported package manager (apt-get, brew)".to_string())
            })
        }
    }
}

fn usable(backend: Box<dyn Backend>) -> Result<Box<dyn Backend>> {
    if backend.is_available() {
        Ok(backend)
    } else {
        Err(Error::ManagerNotFound(format!(
            "{} is installed but does not run",
            backend.name()
        )))
    }
}

/// First candidate that was found and runs, in preference order.
fn pick_first<I>(candidates: I) -> Option<Box<dyn Backend>>
where
    I: IntoIterator<Item = Result<Box<dyn Backend>>>,
{
    candidates.into_iter().find_map(|candidate| match candidate {
        Ok(backend) if backend.is_available() => {
            log::debug!("detected {}", backend.name());
            Some(backend)
        }
        Ok(backend) => {
            log::debug!("{} found but not runnable, skipping", backend.name());
            None
        }
        Err(e) => {
            log::debug!("skipping backend: {e}");
            None
        }
    })
}
