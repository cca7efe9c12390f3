//! Plan builder - diff desired state against probed state

use crate::types::{ActionKind, CurrentState, DesiredState, PackageSpec, PlanAction, ProbedState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered list of actions; order is execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<PlanAction>,
}

impl Plan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions, including noops
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions that mutate the system
    pub fn changes(&self) -> impl Iterator<Item = &PlanAction> {
        self.actions.iter().filter(|a| a.kind.is_change())
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary::from_actions(&self.actions)
    }
}

/// Planned action counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub install: usize,
    pub remove: usize,
    pub upgrade: usize,
    pub noop: usize,
}

impl PlanSummary {
    pub fn from_actions(actions: &[PlanAction]) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action.kind {
                ActionKind::Install => summary.install += 1,
                ActionKind::Remove => summary.remove += 1,
                ActionKind::Upgrade => summary.upgrade += 1,
                ActionKind::Noop => summary.noop += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn changes(&self) -> usize {
        self.install + self.remove + self.upgrade
    }
}

/// Decide the action for one (desired, current) pair
pub fn action_kind(desired: &DesiredState, current: &CurrentState) -> ActionKind {
    match (desired, current) {
        (DesiredState::Installed, CurrentState::Absent) => ActionKind::Install,
        (DesiredState::Installed, CurrentState::Installed { .. }) => ActionKind::Noop,
        (DesiredState::Removed, CurrentState::Installed { .. }) => ActionKind::Remove,
        (DesiredState::Removed, CurrentState::Absent) => ActionKind::Noop,
        (DesiredState::Pinned(_), CurrentState::Absent) => ActionKind::Install,
        (DesiredState::Pinned(want), CurrentState::Installed { version }) => {
            if want == version {
                ActionKind::Noop
            } else {
                ActionKind::Upgrade
            }
        }
    }
}

/// Build a plan in manifest order
///
/// Probed entries are joined to specs by name. A spec without a probe entry
/// is planned as if absent.
pub fn build_plan(specs: &[PackageSpec], probed: &[ProbedState]) -> Plan {
    let by_name: HashMap<&str, &ProbedState> =
        probed.iter().map(|p| (p.name.as_str(), p)).collect();

    let actions = specs
        .iter()
        .map(|spec| {
            let probed = by_name
                .get(spec.name())
                .map(|p| (*p).clone())
                .unwrap_or_else(|| ProbedState::absent(spec.name()));
            let kind = action_kind(spec.desired(), &probed.current);
            PlanAction {
                spec: spec.clone(),
                probed,
                kind,
            }
        })
        .collect();

    Plan { actions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ManifestRecord, load};

    fn installed(v: &str) -> CurrentState {
        CurrentState::Installed { version: v.into() }
    }

    #[test]
    fn test_policy_table_is_exhaustive() {
        let pinned = |v: &str| DesiredState::Pinned(v.into());
        let table = [
            (DesiredState::Installed, CurrentState::Absent, ActionKind::Install),
            (DesiredState::Installed, installed("1.0"), ActionKind::Noop),
            (DesiredState::Removed, installed("1.0"), ActionKind::Remove),
            (DesiredState::Removed, CurrentState::Absent, ActionKind::Noop),
            (pinned("2.0"), installed("1.0"), ActionKind::Upgrade),
            (pinned("1.0"), installed("2.0"), ActionKind::Upgrade),
            (pinned("1.0"), installed("1.0"), ActionKind::Noop),
            (pinned("1.0"), CurrentState::Absent, ActionKind::Install),
        ];

        for (desired, current, expected) in table {
            assert_eq!(
                action_kind(&desired, &current),
                expected,
                "{desired} / {current}"
            );
        }
    }

    #[test]
    fn test_pinned_versions_compare_exactly() {
        let desired = DesiredState::Pinned("1.48".into());
        assert_eq!(
            action_kind(&desired, &installed("1.48.0-3")),
            ActionKind::Upgrade
        );
    }

    #[test]
    fn test_build_plan_follows_manifest_order() {
        let specs = load(vec![
            ManifestRecord::new("libzmq-dev", "installed"),
            ManifestRecord::new("libkqueue0", "removed"),
            ManifestRecord::new("clang", "pinned:3.4"),
        ])
        .unwrap();
        // Probe results deliberately out of order
        let probed = vec![
            ProbedState::installed("clang", "3.0"),
            ProbedState::absent("libzmq-dev"),
            ProbedState::installed("libkqueue0", "1.0.4-2"),
        ];

        let plan = build_plan(&specs, &probed);
        let kinds: Vec<_> = plan.actions.iter().map(|a| (a.name(), a.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("libzmq-dev", ActionKind::Install),
                ("libkqueue0", ActionKind::Remove),
                ("clang", ActionKind::Upgrade),
            ]
        );
        assert_eq!(plan.actions[2].target_version(), Some("3.4"));
    }

    #[test]
    fn test_build_plan_is_deterministic() {
        let specs = load(vec![
            ManifestRecord::new("make", "installed"),
            ManifestRecord::new("automake", "installed"),
        ])
        .unwrap();
        let probed = vec![ProbedState::absent("make"), ProbedState::absent("automake")];

        assert_eq!(build_plan(&specs, &probed), build_plan(&specs, &probed));
    }

    #[test]
    fn test_missing_probe_entry_is_absent() {
        let specs = load(vec![ManifestRecord::new("make", "installed")]).unwrap();
        let plan = build_plan(&specs, &[]);
        assert_eq!(plan.actions[0].kind, ActionKind::Install);
        assert_eq!(plan.actions[0].probed, ProbedState::absent("make"));
    }

    #[test]
    fn test_plan_summary() {
        let specs = load(vec![
            ManifestRecord::new("a", "installed"),
            ManifestRecord::new("b", "installed"),
            ManifestRecord::new("c", "removed"),
        ])
        .unwrap();
        let probed = vec![
            ProbedState::absent("a"),
            ProbedState::installed("b", "1"),
            ProbedState::installed("c", "1"),
        ];
        let plan = build_plan(&specs, &probed);
        let summary = plan.summary();

        assert_eq!(summary.install, 1);
        assert_eq!(summary.remove, 1);
        assert_eq!(summary.noop, 1);
        assert_eq!(summary.changes(), 2);
        assert!(plan.has_changes());
        assert!(!Plan::new().has_changes());
    }
}
