//! Subprocess execution with an optional timeout.
//!
//! Output pipes are drained on background threads so a chatty child can't
//! block on a full pipe while we wait on it.

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

/// A command line about to be run.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: Vec<String>,
    pub env: Vec<(&'a str, &'a str)>,
    pub timeout: Option<Duration>,
}

impl<'a> Invocation<'a> {
    pub fn new(program: &'a str) -> Self {
        Self {
            program,
            args: Vec::new(),
            env: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &'a str, value: &'a str) -> Self {
        self.env.push((key, value));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rendered command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion or until the timeout elapses.
    ///
    /// A timed-out child is killed and reaped before [`Error::Timeout`] is
    /// returned. A non-zero exit is not an error here; callers inspect
    /// [`CommandOutput::success`].
    pub fn run(&self) -> Result<CommandOutput> {
        log::debug!("exec: {}", self.display());

        let mut child = Command::new(self.program)
            .args(&self.args)
            .envs(self.env.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.to_string(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => status,
                None => {
                    log::warn!("{} exceeded {}s, killing", self.program, limit.as_secs());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Timeout {
                        program: self.program.to_string(),
                        after: limit,
                    });
                }
            },
            None => child.wait()?,
        };

        let output = CommandOutput {
            stdout: collect(stdout),
            stderr: collect(stderr),
            success: status.success(),
            code: status.code(),
        };

        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::trace!("[{}] {}", self.program, line);
        }

        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Locate an executable: known install locations first, then `which`.
pub fn find_program(name: &str, known_paths: &[&str]) -> Option<String> {
    if let Some(path) = known_paths.iter().find(|p| Path::new(p).exists()) {
        return Some((*path).to_string());
    }

    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then_some(path)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_output() {
        let output = Invocation::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .run()
            .unwrap();

        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
    }

    #[test]
    fn test_run_passes_env() {
        let output = Invocation::new("sh")
            .args(["-c", "printf %s \"$DEBIAN_FRONTEND\""])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .run()
            .unwrap();
        assert_eq!(output.stdout, "noninteractive");
    }

    #[test]
    fn test_run_times_out() {
        let err = Invocation::new("sleep")
            .arg("5")
            .timeout(Some(Duration::from_millis(100)))
            .run()
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { ref program, .. } if program == "sleep"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = Invocation::new("pantry-definitely-not-a-program")
            .run()
            .unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::ManagerNotFound);
    }

    #[test]
    fn test_display() {
        let inv = Invocation::new("apt-get").args(["install", "-y", "make"]);
        assert_eq!(inv.display(), "apt-get install -y make");
    }

    #[test]
    fn test_find_program_prefers_known_path() {
        assert_eq!(
            find_program("sh", &["/bin/sh"]).as_deref(),
            Some("/bin/sh")
        );
        assert!(find_program("pantry-definitely-not-a-program", &[]).is_none());
    }
}
