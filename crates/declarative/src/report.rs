//! Run summary aggregation and exit code mapping

use crate::types::{ActionKind, ActionResult, Outcome, RunState};
use serde::{Deserialize, Serialize};

/// Completed with no failures
pub const EXIT_OK: i32 = 0;
/// Completed with at least one failure
pub const EXIT_FAILURES: i32 = 1;
/// Halted after a failure
pub const EXIT_HALTED: i32 = 2;
/// Manifest or probe error, nothing was changed
pub const EXIT_FATAL: i32 = 3;
/// Cancelled by the user (128 + SIGINT)
pub const EXIT_CANCELLED: i32 = 130;

/// First failed action of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub package: String,
    pub action: ActionKind,
    pub reason: String,
}

/// Counts of what a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub installed: usize,
    pub removed: usize,
    pub upgraded: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub first_failure: Option<FailureDetail>,
}

impl RunSummary {
    /// Aggregate results; pure
    pub fn from_results(results: &[ActionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.add_result(result);
        }
        summary
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ActionResult) {
        match &result.outcome {
            Outcome::Success => match result.action.kind {
                ActionKind::Install => self.installed += 1,
                ActionKind::Remove => self.removed += 1,
                ActionKind::Upgrade => self.upgraded += 1,
                ActionKind::Noop => self.unchanged += 1,
            },
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { reason } => {
                self.failed += 1;
                if self.first_failure.is_none() {
                    self.first_failure = Some(FailureDetail {
                        package: result.action.name().to_string(),
                        action: result.action.kind,
                        reason: reason.clone(),
                    });
                }
            }
        }
    }

    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.installed + self.removed + self.upgraded
    }

    /// Total number of actions accounted for
    pub fn total(&self) -> usize {
        self.total_changes() + self.unchanged + self.skipped + self.failed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for a run that reached `state`
    pub fn exit_code(&self, state: RunState) -> i32 {
        match state {
            RunState::Halted => EXIT_HALTED,
            _ if self.failed > 0 => EXIT_FAILURES,
            _ => EXIT_OK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ManifestRecord, load};
    use crate::types::{PlanAction, ProbedState};

    fn result(name: &str, kind: ActionKind, outcome: Outcome) -> ActionResult {
        let spec = load(vec![ManifestRecord::new(name, "installed")])
            .unwrap()
            .remove(0);
        ActionResult {
            action: PlanAction {
                spec,
                probed: ProbedState::absent(name),
                kind,
            },
            outcome,
        }
    }

    fn failed(reason: &str) -> Outcome {
        Outcome::Failed {
            reason: reason.into(),
        }
    }

    #[test]
    fn test_empty_run_is_all_zero() {
        let summary = RunSummary::from_results(&[]);
        assert_eq!(summary, RunSummary::default());
        assert_eq!(summary.exit_code(RunState::Completed), EXIT_OK);
    }

    #[test]
    fn test_counts_by_kind_and_outcome() {
        let results = vec![
            result("a", ActionKind::Install, Outcome::Success),
            result("b", ActionKind::Remove, Outcome::Success),
            result("c", ActionKind::Upgrade, Outcome::Success),
            result("d", ActionKind::Noop, Outcome::Unchanged),
            result("e", ActionKind::Install, failed("E: Unable to locate package e")),
            result("f", ActionKind::Install, failed("timeout")),
            result(
                "g",
                ActionKind::Install,
                Outcome::Skipped {
                    reason: "halted".into(),
                },
            ),
        ];
        let summary = RunSummary::from_results(&results);

        assert_eq!(summary.installed, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.upgraded, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), results.len());
        assert_eq!(
            summary.first_failure,
            Some(FailureDetail {
                package: "e".into(),
                action: ActionKind::Install,
                reason: "E: Unable to locate package e".into(),
            })
        );
    }

    #[test]
    fn test_exit_codes() {
        let clean = RunSummary::default();
        let failing = RunSummary {
            failed: 1,
            ..Default::default()
        };

        assert_eq!(clean.exit_code(RunState::Completed), EXIT_OK);
        assert_eq!(failing.exit_code(RunState::Completed), EXIT_FAILURES);
        assert_eq!(failing.exit_code(RunState::Halted), EXIT_HALTED);
    }
}
