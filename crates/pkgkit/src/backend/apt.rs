//! Debian/Ubuntu backend: `dpkg-query` for probing, `apt-get` for changes.

use crate::backend::Backend;
use crate::command::{Invocation, find_program};
use crate::error::{Error, Result};
use crate::types::BackendOptions;
use std::time::Duration;

const DPKG_FORMAT: &str = "${Status}\t${Version}\n";

/// Untranslated messages, so stderr classification holds on any locale.
const LOCALE: (&str, &str) = ("LC_ALL", "C");

/// Backend that executes `apt-get` and `dpkg-query`.
pub struct AptBackend {
    apt_get: String,
    dpkg_query: String,
    sudo: bool,
}

impl AptBackend {
    /// Returns an error if either tool is missing.
    pub fn new(options: BackendOptions) -> Result<Self> {
        let apt_get = find_program("apt-get", &["/usr/bin/apt-get"])
            .ok_or_else(|| Error::ManagerNotFound("apt-get".to_string()))?;
        let dpkg_query = find_program("dpkg-query", &["/usr/bin/dpkg-query"])
            .ok_or_else(|| Error::ManagerNotFound("dpkg-query".to_string()))?;
        Ok(Self {
            apt_get,
            dpkg_query,
            sudo: options.sudo,
        })
    }

    /// Build an `apt-get` invocation, wrapped in `sudo -n env` when needed.
    fn apt_get(&self, args: Vec<String>, timeout: Option<Duration>) -> Invocation<'_> {
        if self.sudo {
            // sudo resets the environment, so pass it through `env`
            Invocation::new("sudo")
                .args(["-n", "env", "LC_ALL=C", "DEBIAN_FRONTEND=noninteractive"])
                .arg(self.apt_get.as_str())
                .args(args)
                .timeout(timeout)
        } else {
            Invocation::new(&self.apt_get)
                .args(args)
                .env(LOCALE.0, LOCALE.1)
                .env("DEBIAN_FRONTEND", "noninteractive")
                .timeout(timeout)
        }
    }

    fn dpkg_query(&self, name: &str) -> Invocation<'_> {
        Invocation::new(&self.dpkg_query)
            .args(["-W", "-f", DPKG_FORMAT, name])
            .env(LOCALE.0, LOCALE.1)
    }

    fn run_checked(&self, invocation: &Invocation<'_>, package: &str) -> Result<()> {
        let output = invocation.run()?;
        if output.success {
            Ok(())
        } else {
            Err(Error::from_output("apt", &output.stderr, Some(package)))
        }
    }
}

impl Backend for AptBackend {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn is_available(&self) -> bool {
        Invocation::new(&self.apt_get)
            .arg("--version")
            .run()
            .is_ok_and(|o| o.success)
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = self.dpkg_query(name).run()?;

        if !output.success {
            if is_unknown_package(&output.stderr) {
                return Ok(None);
            }
            return Err(Error::from_output("dpkg-query", &output.stderr, Some(name)));
        }

        Ok(parse_dpkg_status(&output.stdout))
    }

    fn install(&self, name: &str, version: Option<&str>, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(&self.apt_get(install_args(name, version), timeout), name)
    }

    fn remove(&self, name: &str, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(&self.apt_get(remove_args(name), timeout), name)
    }

    fn needs_privileges(&self) -> bool {
        true
    }
}

/// Version of the first fully installed entry in `dpkg-query` output.
///
/// Lines look like `install ok installed\t1.2.3`. Packages in any other
/// status (config-files, half-installed, not-installed) count as absent.
pub fn parse_dpkg_status(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (status, version) = line.split_once('\t')?;
        let installed = status.split_whitespace().nth(2) == Some("installed");
        let version = version.trim();
        (installed && !version.is_empty()).then(|| version.to_string())
    })
}

/// Whether a failed `dpkg-query -W` means the package was never seen.
///
/// dpkg-query exits 1 with `no packages found matching <name>`.
pub fn is_unknown_package(stderr: &str) -> bool {
    stderr.to_lowercase().contains("no packages found matching")
}

/// `apt-get install` arguments; a pinned version may be a downgrade.
pub fn install_args(name: &str, version: Option<&str>) -> Vec<String> {
    let mut args = vec!["install".to_string(), "-y".to_string()];
    match version {
        Some(v) => {
            args.push("--allow-downgrades".to_string());
            args.push(format!("{name}={v}"));
        }
        None => args.push(name.to_string()),
    }
    args
}

pub fn remove_args(name: &str) -> Vec<String> {
    vec!["remove".to_string(), "-y".to_string(), name.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dpkg_status_installed() {
        assert_eq!(
            parse_dpkg_status("install ok installed\t1.0.4-2ubuntu1\n").as_deref(),
            Some("1.0.4-2ubuntu1")
        );
    }

    #[test]
    fn test_parse_dpkg_status_not_installed() {
        assert_eq!(parse_dpkg_status("unknown ok not-installed\t\n"), None);
        assert_eq!(parse_dpkg_status("deinstall ok config-files\t3.0-6\n"), None);
        assert_eq!(parse_dpkg_status(""), None);
    }

    #[test]
    fn test_parse_dpkg_status_multiarch() {
        let out = "deinstall ok config-files\t2.0\ninstall ok installed\t2.1\n";
        assert_eq!(parse_dpkg_status(out).as_deref(), Some("2.1"));
    }

    #[test]
    fn test_install_args() {
        assert_eq!(install_args("make", None), ["install", "-y", "make"]);
        assert_eq!(
            install_args("clang", Some("3.4")),
            ["install", "-y", "--allow-downgrades", "clang=3.4"]
        );
    }

    #[test]
    fn test_remove_args() {
        assert_eq!(remove_args("libkqueue0"), ["remove", "-y", "libkqueue0"]);
    }

    #[test]
    fn test_sudo_wraps_invocation() {
        let backend = AptBackend {
            apt_get: "/usr/bin/apt-get".into(),
            dpkg_query: "/usr/bin/dpkg-query".into(),
            sudo: true,
        };
        let inv = backend.apt_get(remove_args("make"), None);
        assert_eq!(
            inv.display(),
            "sudo -n env LC_ALL=C DEBIAN_FRONTEND=noninteractive /usr/bin/apt-get remove -y make"
        );

        let plain = AptBackend {
            sudo: false,
            ..backend
        };
        let inv = plain.apt_get(remove_args("make"), None);
        assert_eq!(inv.display(), "/usr/bin/apt-get remove -y make");
        assert_eq!(
            inv.env,
            [("LC_ALL", "C"), ("DEBIAN_FRONTEND", "noninteractive")]
        );

        let query = plain.dpkg_query("make");
        assert_eq!(query.env, [("LC_ALL", "C")]);
    }

    #[test]
    fn test_is_unknown_package() {
        assert!(is_unknown_package(
            "dpkg-query: no packages found matching libcurl4-openssl-dev\n"
        ));
        assert!(!is_unknown_package(
            "dpkg-query: error: --show needs at least one package name argument"
        ));
        assert!(!is_unknown_package(""));
    }
}
