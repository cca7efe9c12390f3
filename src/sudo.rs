//! Scoped sudo context
//!
//! Sudo is never requested for the whole process. Instead:
//! 1. The plan is computed unprivileged
//! 2. Credentials are cached once, after the user confirms the changes
//! 3. Package manager commands run through `sudo -n`
//! 4. The cached credentials are dropped when the context goes away

use anyhow::{Context, Result, bail};
use std::process::{Command, Stdio};

use crate::config::SudoMode;

/// Whether the process already runs as root
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Whether package manager commands should be prefixed with `sudo -n`
pub fn wants_sudo(mode: SudoMode, root: bool) -> bool {
    match mode {
        SudoMode::Always => true,
        SudoMode::Never => false,
        SudoMode::Auto => !root,
    }
}

/// Scoped sudo context - automatically invalidates on drop
pub struct SudoContext {
    _private: (),
}

impl SudoContext {
    /// Acquire sudo privileges with a reason shown to user
    pub fn acquire(reason: &str) -> Result<Self> {
        if Self::is_valid() {
            log::debug!("sudo credentials already cached");
            return Ok(Self { _private: () });
        }

        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        // Validate sudo (will prompt for password)
        let status = Command::new("sudo")
            .arg("-v")
            .status()
            .context("Failed to execute sudo")?;

        if !status.success() {
            bail!("Failed to acquire sudo privileges");
        }

        Ok(Self { _private: () })
    }

    /// Check if sudo is currently valid (without prompting)
    pub fn is_valid() -> bool {
        Command::new("sudo")
            .args(["-n", "true"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        // Invalidate sudo timestamp to release privileges
        let _ = Command::new("sudo").arg("-k").status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_sudo() {
        assert!(wants_sudo(SudoMode::Auto, false));
        assert!(!wants_sudo(SudoMode::Auto, true));
        assert!(wants_sudo(SudoMode::Always, true));
        assert!(!wants_sudo(SudoMode::Never, false));
    }
}
