//! Execution engine - applies a plan strictly in order
//!
//! Every action gets exactly one [`ActionResult`]. Package manager failures
//! never escape as errors; they are captured and the [`FailurePolicy`]
//! decides whether the remaining actions run.

use crate::context::{ApplyContext, CancelToken, ConfirmCallback, PackageManager, ProgressCallback};
use crate::planner::Plan;
use crate::types::{
    ActionKind, ActionResult, ExecuteOptions, FailurePolicy, Outcome, PlanAction, RunState,
};

/// Skip reason for actions after a halting failure
pub const SKIP_HALTED: &str = "halted";
/// Skip reason for actions after cancellation
pub const SKIP_CANCELLED: &str = "cancelled";
/// Skip reason when the user declined to apply
pub const SKIP_DECLINED: &str = "declined";
/// Skip reason for change actions in a dry run
pub const SKIP_DRY_RUN: &str = "dry run";

/// Everything the executor produced
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// One result per plan action, in plan order
    pub results: Vec<ActionResult>,
    /// A failure stopped the run under [`FailurePolicy::Halt`]
    pub halted: bool,
    /// Cancellation was observed before the plan finished
    pub cancelled: bool,
    /// The confirmation callback declined
    pub declined: bool,
}

impl Execution {
    /// Terminal run state
    pub fn state(&self) -> RunState {
        if self.halted {
            RunState::Halted
        } else {
            RunState::Completed
        }
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `plan` - The plan to run; consumed, its actions move into the results
/// * `manager` - Package manager used for install/remove
/// * `opts` - Execution options (dry_run, policy, timeout, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Asked once before the first mutation
/// * `cancel` - Checked before each action
pub fn execute<M, P, C>(
    plan: Plan,
    manager: &M,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
    cancel: &CancelToken,
) -> Execution
where
    M: PackageManager + ?Sized,
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback + ?Sized,
{
    let changes = plan.summary().changes();
    let mut execution = Execution {
        results: Vec::with_capacity(plan.len()),
        ..Default::default()
    };

    progress.on_start(plan.len(), changes);

    // Reason to skip change actions without touching the system
    let mut gate: Option<&'static str> = None;
    if changes > 0 {
        if opts.dry_run {
            gate = Some(SKIP_DRY_RUN);
        } else if !confirm.confirm(&format!("Apply {changes} change(s) with {}?", manager.name())) {
            log::info!("user declined to apply {changes} change(s)");
            execution.declined = true;
            gate = Some(SKIP_DECLINED);
        }
    }

    // Reason to skip every remaining action
    let mut stop: Option<&'static str> = None;
    let ctx = ApplyContext::new(opts.timeout, opts.verbose);

    for (index, action) in plan.actions.into_iter().enumerate() {
        if stop.is_none() && cancel.is_cancelled() {
            log::warn!("run cancelled before {}", action.name());
            execution.cancelled = true;
            stop = Some(SKIP_CANCELLED);
        }

        let result = if let Some(reason) = stop {
            ActionResult::skipped(action, reason)
        } else if !action.kind.is_change() {
            ActionResult {
                action,
                outcome: Outcome::Unchanged,
            }
        } else if let Some(reason) = gate {
            ActionResult::skipped(action, reason)
        } else {
            progress.on_action_start(index, &action);
            apply_action(manager, action, &ctx)
        };

        if result.outcome.is_failure() && opts.policy == FailurePolicy::Halt {
            log::warn!("halting after failure of {}", result.action.name());
            execution.halted = true;
            stop = Some(SKIP_HALTED);
        }

        progress.on_action_complete(index, &result);
        execution.results.push(result);
    }

    progress.on_finish();
    execution
}

/// Invoke the package manager for one change action
fn apply_action<M>(manager: &M, action: PlanAction, ctx: &ApplyContext) -> ActionResult
where
    M: PackageManager + ?Sized,
{
    let name = action.name();
    let outcome = match action.kind {
        ActionKind::Install | ActionKind::Upgrade => {
            manager.install(name, action.target_version(), ctx)
        }
        ActionKind::Remove => manager.remove(name, ctx),
        ActionKind::Noop => Ok(()),
    };

    let outcome = match outcome {
        Ok(()) => {
            log::info!("{} {}: ok", action.kind, name);
            Outcome::Success
        }
        Err(e) => {
            log::warn!("{} {}: {}", action.kind, name, e);
            Outcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    ActionResult { action, outcome }
}

/// Execute with no progress reporting and auto-confirm
pub fn execute_simple<M>(plan: Plan, manager: &M, opts: &ExecuteOptions) -> Execution
where
    M: PackageManager + ?Sized,
{
    use crate::context::{AutoConfirm, NoProgress};

    execute(
        plan,
        manager,
        opts,
        &mut NoProgress,
        &mut AutoConfirm,
        &CancelToken::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::error::{ExecutionError, ProbeError};
    use crate::loader::{ManifestRecord, load};
    use crate::planner::build_plan;
    use crate::types::{CurrentState, ProbedState};
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Package manager that fails for a fixed set of names
    #[derive(Default)]
    struct ScriptedManager {
        failing: HashSet<&'static str>,
        timing_out: HashSet<&'static str>,
        calls: RefCell<Vec<String>>,
        cancel_after_first_call: Option<CancelToken>,
    }

    impl PackageManager for ScriptedManager {
        fn name(&self) -> &str {
            "scripted"
        }

        fn query(&self, _name: &str) -> Result<CurrentState, ProbeError> {
            Ok(CurrentState::Absent)
        }

        fn install(
            &self,
            name: &str,
            version: Option<&str>,
            _ctx: &ApplyContext,
        ) -> Result<(), ExecutionError> {
            let call = match version {
                Some(v) => format!("install {name}={v}"),
                None => format!("install {name}"),
            };
            self.record(call);
            self.outcome(name)
        }

        fn remove(&self, name: &str, _ctx: &ApplyContext) -> Result<(), ExecutionError> {
            self.record(format!("remove {name}"));
            self.outcome(name)
        }
    }

    impl ScriptedManager {
        fn failing(names: &[&'static str]) -> Self {
            Self {
                failing: names.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
            if let Some(token) = &self.cancel_after_first_call {
                token.cancel();
            }
        }

        fn outcome(&self, name: &str) -> Result<(), ExecutionError> {
            if self.timing_out.contains(name) {
                Err(ExecutionError::Timeout)
            } else if self.failing.contains(name) {
                Err(ExecutionError::failed(format!(
                    "E: Unable to locate package {name}"
                )))
            } else {
                Ok(())
            }
        }
    }

    /// Plan where every package is absent, so each `installed` spec installs
    fn plan_of(records: &[(&str, &str)], installed: &[(&str, &str)]) -> Plan {
        let specs = load(
            records
                .iter()
                .map(|(n, s)| ManifestRecord::new(*n, *s))
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let probed: Vec<_> = specs
            .iter()
            .map(|s| {
                installed
                    .iter()
                    .find(|(n, _)| *n == s.name())
                    .map(|(n, v)| ProbedState::installed(*n, *v))
                    .unwrap_or_else(|| ProbedState::absent(s.name()))
            })
            .collect();
        build_plan(&specs, &probed)
    }

    fn outcomes(execution: &Execution) -> Vec<Outcome> {
        execution
            .results
            .iter()
            .map(|r| r.outcome.clone())
            .collect()
    }

    fn skipped(reason: &str) -> Outcome {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let manager = ScriptedManager::default();
        let execution = execute_simple(Plan::new(), &manager, &ExecuteOptions::default());

        assert!(execution.results.is_empty());
        assert_eq!(execution.state(), RunState::Completed);
        assert!(manager.calls.borrow().is_empty());
    }

    #[test]
    fn test_dispatches_by_action_kind() {
        let plan = plan_of(
            &[
                ("libprotobuf-dev", "installed"),
                ("libzmq1", "removed"),
                ("clang", "pinned:3.4"),
                ("make", "installed"),
            ],
            &[("libzmq1", "2.1.11-1"), ("clang", "3.0"), ("make", "3.81")],
        );
        let manager = ScriptedManager::default();
        let execution = execute_simple(plan, &manager, &ExecuteOptions::default());

        assert_eq!(
            *manager.calls.borrow(),
            vec!["install libprotobuf-dev", "remove libzmq1", "install clang=3.4"]
        );
        assert_eq!(
            outcomes(&execution),
            vec![
                Outcome::Success,
                Outcome::Success,
                Outcome::Success,
                Outcome::Unchanged
            ]
        );
    }

    #[test]
    fn test_halt_skips_everything_after_failure() {
        let plan = plan_of(
            &[
                ("build-essential", "installed"),
                ("libssl-dev", "installed"),
                ("clang", "installed"),
                ("make", "installed"),
            ],
            &[("make", "3.81")],
        );
        let manager = ScriptedManager::failing(&["libssl-dev"]);
        let opts = ExecuteOptions {
            policy: FailurePolicy::Halt,
            ..Default::default()
        };
        let execution = execute_simple(plan, &manager, &opts);

        assert_eq!(execution.state(), RunState::Halted);
        let outcomes = outcomes(&execution);
        assert_eq!(outcomes[0], Outcome::Success);
        assert!(outcomes[1].is_failure());
        assert_eq!(outcomes[2], skipped(SKIP_HALTED));
        assert_eq!(outcomes[3], skipped(SKIP_HALTED));
        assert_eq!(manager.calls.borrow().len(), 2);
    }

    #[test]
    fn test_continue_attempts_every_action() {
        let plan = plan_of(
            &[
                ("libzmq-dev", "installed"),
                ("libzmq-dbg", "installed"),
                ("libzmq1", "installed"),
            ],
            &[],
        );
        let manager = ScriptedManager::failing(&["libzmq-dev", "libzmq1"]);
        let opts = ExecuteOptions {
            policy: FailurePolicy::Continue,
            ..Default::default()
        };
        let execution = execute_simple(plan, &manager, &opts);

        assert_eq!(execution.state(), RunState::Completed);
        assert_eq!(manager.calls.borrow().len(), 3);
        let failed = execution
            .results
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count();
        assert_eq!(failed, 2);
    }

    #[test]
    fn test_timeout_is_reported_as_timeout() {
        let plan = plan_of(&[("libboost1.48-doc", "installed")], &[]);
        let manager = ScriptedManager {
            timing_out: ["libboost1.48-doc"].into_iter().collect(),
            ..Default::default()
        };
        let execution = execute_simple(plan, &manager, &ExecuteOptions::default());

        assert_eq!(
            outcomes(&execution),
            vec![Outcome::Failed {
                reason: "timeout".into()
            }]
        );
    }

    #[test]
    fn test_cancellation_between_actions() {
        let token = CancelToken::new();
        let plan = plan_of(
            &[("clang", "installed"), ("make", "installed"), ("automake", "installed")],
            &[],
        );
        let manager = ScriptedManager {
            cancel_after_first_call: Some(token.clone()),
            ..Default::default()
        };
        let execution = execute(
            plan,
            &manager,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
            &token,
        );

        // The in-flight action completes; the rest never start
        assert_eq!(
            outcomes(&execution),
            vec![
                Outcome::Success,
                skipped(SKIP_CANCELLED),
                skipped(SKIP_CANCELLED)
            ]
        );
        assert!(execution.cancelled);
        assert_eq!(execution.state(), RunState::Completed);
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let plan = plan_of(&[("clang", "installed")], &[]);
        let manager = ScriptedManager::default();
        let execution = execute(
            plan,
            &manager,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
            &token,
        );

        assert!(manager.calls.borrow().is_empty());
        assert_eq!(outcomes(&execution), vec![skipped(SKIP_CANCELLED)]);
    }

    #[test]
    fn test_declined_skips_changes_only() {
        let plan = plan_of(&[("clang", "installed"), ("make", "installed")], &[("make", "3.81")]);
        let manager = ScriptedManager::default();
        let execution = execute(
            plan,
            &manager,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
            &CancelToken::new(),
        );

        assert!(execution.declined);
        assert!(manager.calls.borrow().is_empty());
        assert_eq!(
            outcomes(&execution),
            vec![skipped(SKIP_DECLINED), Outcome::Unchanged]
        );
    }

    #[test]
    fn test_dry_run_does_not_mutate_or_ask() {
        struct PanicConfirm;
        impl ConfirmCallback for PanicConfirm {
            fn confirm(&mut self, _prompt: &str) -> bool {
                panic!("dry run must not prompt");
            }
        }

        let plan = plan_of(&[("autoconf", "installed")], &[]);
        let manager = ScriptedManager::default();
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let execution = execute(
            plan,
            &manager,
            &opts,
            &mut NoProgress,
            &mut PanicConfirm,
            &CancelToken::new(),
        );

        assert!(manager.calls.borrow().is_empty());
        assert_eq!(outcomes(&execution), vec![skipped(SKIP_DRY_RUN)]);
    }

    #[test]
    fn test_no_changes_does_not_prompt() {
        let plan = plan_of(&[("make", "installed")], &[("make", "3.81")]);
        let execution = execute(
            plan,
            &ScriptedManager::default(),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
            &CancelToken::new(),
        );
        assert!(!execution.declined);
        assert_eq!(outcomes(&execution), vec![Outcome::Unchanged]);
    }
}
