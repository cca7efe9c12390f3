//! Collaborator and callback traits
//!
//! These traits let the engine run without depending on a specific package
//! manager, terminal UI or signal handling.

use crate::error::{ExecutionError, ProbeError};
use crate::types::{ActionResult, CurrentState, PlanAction};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Context passed to every mutating package manager call
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Give up on the invocation after this long
    pub timeout: Option<Duration>,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    pub fn new(timeout: Option<Duration>, verbose: bool) -> Self {
        Self { timeout, verbose }
    }
}

/// The system package manager, as seen by the engine
///
/// Dependency resolution and downloads stay on the other side of this trait.
pub trait PackageManager {
    /// Short name used in logs and reports (e.g. "apt")
    fn name(&self) -> &str;

    /// Installed state of one package
    ///
    /// An unknown package is `Ok(CurrentState::Absent)`. `Err` means the query
    /// mechanism itself is broken.
    fn query(&self, name: &str) -> Result<CurrentState, ProbeError>;

    /// Installed state of a package pinned to `version`
    ///
    /// Managers that install pins under a different name (Homebrew's
    /// `name@version`) look that name up here.
    fn query_pinned(&self, name: &str, _version: &str) -> Result<CurrentState, ProbeError> {
        self.query(name)
    }

    /// Install a package, at `version` if given
    fn install(
        &self,
        name: &str,
        version: Option<&str>,
        ctx: &ApplyContext,
    ) -> Result<(), ExecutionError>;

    /// Remove a package
    fn remove(&self, name: &str, ctx: &ApplyContext) -> Result<(), ExecutionError>;

    /// Whether mutating calls need elevated privileges
    fn needs_privileges(&self) -> bool {
        false
    }
}

impl<M: PackageManager + ?Sized> PackageManager for &M {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn query(&self, name: &str) -> Result<CurrentState, ProbeError> {
        (**self).query(name)
    }
    fn query_pinned(&self, name: &str, version: &str) -> Result<CurrentState, ProbeError> {
        (**self).query_pinned(name, version)
    }
    fn install(
        &self,
        name: &str,
        version: Option<&str>,
        ctx: &ApplyContext,
    ) -> Result<(), ExecutionError> {
        (**self).install(name, version, ctx)
    }
    fn remove(&self, name: &str, ctx: &ApplyContext) -> Result<(), ExecutionError> {
        (**self).remove(name, ctx)
    }
    fn needs_privileges(&self) -> bool {
        (**self).needs_privileges()
    }
}

impl<M: PackageManager + ?Sized> PackageManager for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn query(&self, name: &str) -> Result<CurrentState, ProbeError> {
        (**self).query(name)
    }
    fn install(
        &self,
        name: &str,
        version: Option<&str>,
        ctx: &ApplyContext,
    ) -> Result<(), ExecutionError> {
        (**self).install(name, version, ctx)
    }
    fn remove(&self, name: &str, ctx: &ApplyContext) -> Result<(), ExecutionError> {
        (**self).remove(name, ctx)
    }
    fn needs_privileges(&self) -> bool {
        (**self).needs_privileges()
    }
}

/// Progress callback for execution
///
/// Indices are positions in the plan.
pub trait ProgressCallback {
    /// Called once before the first action, with the number of changes
    fn on_start(&mut self, total: usize, changes: usize);

    /// Called before the package manager is invoked for a change action
    fn on_action_start(&mut self, index: usize, action: &PlanAction);

    /// Called for every action once its result is known
    fn on_action_complete(&mut self, index: usize, result: &ActionResult);

    /// Called after the last action
    fn on_finish(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm; `false` declines
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _total: usize, _changes: usize) {}
    fn on_action_start(&mut self, _index: usize, _action: &PlanAction) {}
    fn on_action_complete(&mut self, _index: usize, _result: &ActionResult) {}
    fn on_finish(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Shared cancellation flag, checked between actions
///
/// Clones observe the same flag, so one can be moved into a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
