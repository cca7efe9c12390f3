//! Homebrew backend using `brew` commands.

use crate::backend::Backend;
use crate::command::{CommandOutput, Invocation, find_program};
use crate::error::{Error, Result};
use std::time::Duration;

const BREW_PATHS: &[&str] = &[
    "/opt/homebrew/bin/brew",              // Apple Silicon
    "/usr/local/bin/brew",                 // Intel
    "/home/linuxbrew/.linuxbrew/bin/brew", // Linux
];

/// Backend that executes real `brew` commands.
pub struct BrewBackend {
    /// Path to the brew executable
    brew_path: String,
}

impl BrewBackend {
    /// Returns an error if Homebrew is not installed.
    pub fn new() -> Result<Self> {
        let brew_path = find_program("brew", BREW_PATHS)
            .ok_or_else(|| Error::ManagerNotFound("brew".to_string()))?;
        Ok(Self { brew_path })
    }

    fn run_brew(&self, args: &[&str], timeout: Option<Duration>) -> Result<CommandOutput> {
        Invocation::new(&self.brew_path)
            .args(args.iter().copied())
            .env("HOMEBREW_NO_AUTO_UPDATE", "1")
            .env("HOMEBREW_NO_INSTALL_CLEANUP", "1")
            .timeout(timeout)
            .run()
    }

    fn run_brew_checked(
        &self,
        args: &[&str],
        package_name: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let output = self.run_brew(args, timeout)?;
        if output.success {
            Ok(())
        } else {
            Err(Error::from_output("brew", &output.stderr, Some(package_name)))
        }
    }
}

impl Backend for BrewBackend {
    fn name(&self) -> &'static str {
        "brew"
    }

    fn is_available(&self) -> bool {
        self.run_brew(&["--version"], None).is_ok_and(|o| o.success)
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = self.run_brew(&["info", "--json=v2", "--formula", name], None)?;

        if !output.success {
            let err = Error::from_output("brew", &output.stderr, Some(name));
            // Unknown formula is simply not installed
            return match err {
                Error::NotFound { .. } => Ok(None),
                other => Err(other),
            };
        }

        let json: serde_json::Value = serde_json::from_str(&output.stdout)?;
        Ok(parse_installed_version(&json))
    }

    fn installed_pinned(&self, name: &str, version: &str) -> Result<Option<String>> {
        let formula = formula_ref(name, Some(version));
        match self.installed_version(&formula)? {
            Some(installed) => Ok(Some(pinned_version(&installed, version))),
            None => self.installed_version(name),
        }
    }

    fn install(&self, name: &str, version: Option<&str>, timeout: Option<Duration>) -> Result<()> {
        let target = formula_ref(name, version);
        self.run_brew_checked(&["install", "--formula", &target], name, timeout)
    }

    fn remove(&self, name: &str, timeout: Option<Duration>) -> Result<()> {
        self.run_brew_checked(&["uninstall", "--formula", name], name, timeout)
    }
}

/// Versioned formulae are addressed as `name@version`.
pub fn formula_ref(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{name}@{v}"),
        None => name.to_string(),
    }
}

/// Version reported for an installed `name@pin` formula.
///
/// `python@3.11` installs `3.11.6`; a release within the pinned series
/// satisfies the pin.
pub fn pinned_version(installed: &str, pin: &str) -> String {
    let in_series = installed
        .strip_prefix(pin)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '_']));
    if in_series {
        pin.to_string()
    } else {
        installed.to_string()
    }
}

/// First installed version from `brew info --json=v2` output.
pub fn parse_installed_version(json: &serde_json::Value) -> Option<String> {
    json["formulae"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|f| f["installed"].as_array())
        .and_then(|arr| arr.first())
        .and_then(|i| i["version"].as_str())
        .map(str::to_string)
}
