//! Core types for declarative package provisioning

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Desired state of a package as declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    /// Package must be present, any version
    Installed,
    /// Package must be absent
    Removed,
    /// Package must be present at exactly this version
    Pinned(String),
}

impl DesiredState {
    /// Prefix used by the manifest syntax for pinned versions
    pub const PINNED_PREFIX: &'static str = "pinned:";

    /// Parse the manifest syntax: `installed`, `removed` or `pinned:<version>`
    ///
    /// Returns `None` for anything else, including a pin with no version.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "installed" => Some(Self::Installed),
            "removed" => Some(Self::Removed),
            other => {
                let version = other.strip_prefix(Self::PINNED_PREFIX)?.trim();
                if version.is_empty() {
                    None
                } else {
                    Some(Self::Pinned(version.to_string()))
                }
            }
        }
    }

    /// The pinned version, if any
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Pinned(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::Removed => write!(f, "removed"),
            Self::Pinned(v) => write!(f, "{}{v}", Self::PINNED_PREFIX),
        }
    }
}

/// A single package declaration
///
/// Immutable once loaded; build these through [`crate::loader::load`] so the
/// manifest invariants (non-empty, unique names) hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    name: String,
    desired: DesiredState,
}

impl PackageSpec {
    pub(crate) fn new(name: impl Into<String>, desired: DesiredState) -> Self {
        Self {
            name: name.into(),
            desired,
        }
    }

    /// Package name as passed to the package manager
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Desired state
    pub fn desired(&self) -> &DesiredState {
        &self.desired
    }
}

/// Installed state of a package on the target system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentState {
    /// Not installed
    Absent,
    /// Installed at the given version
    Installed { version: String },
}

impl CurrentState {
    /// Installed version, if present
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Installed { version } => Some(version),
            Self::Absent => None,
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

impl fmt::Display for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Installed { version } => write!(f, "installed ({version})"),
        }
    }
}

/// Result of probing one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedState {
    pub name: String,
    pub current: CurrentState,
}

impl ProbedState {
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: CurrentState::Absent,
        }
    }

    pub fn installed(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: CurrentState::Installed {
                version: version.into(),
            },
        }
    }
}

/// What the executor will do for one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Install,
    Remove,
    Upgrade,
    Noop,
}

impl ActionKind {
    /// Whether this action mutates the system
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Noop)
    }

    /// Verb used in progress and report output
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
            Self::Upgrade => "upgrade",
            Self::Noop => "keep",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAction {
    pub spec: PackageSpec,
    pub probed: ProbedState,
    pub kind: ActionKind,
}

impl PlanAction {
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Version to request from the package manager, if the spec pins one
    pub fn target_version(&self) -> Option<&str> {
        self.spec.desired().version()
    }
}

/// How one action ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The package manager applied the action
    Success,
    /// Noop action; the package manager was not invoked
    Unchanged,
    /// The package manager reported a failure
    Failed { reason: String },
    /// Not attempted (halt, cancellation, declined, dry run)
    Skipped { reason: String },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Result of executing one plan action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: PlanAction,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ActionResult {
    pub fn skipped(action: PlanAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }
}

/// What to do after a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop, and report every remaining action as skipped
    #[default]
    #[serde(alias = "halt-on-first-failure")]
    Halt,
    /// Attempt every action and aggregate the failures
    #[serde(alias = "continue-on-failure")]
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halt => write!(f, "halt"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Run-level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Loaded,
    Probed,
    Planned,
    Executing,
    Completed,
    Halted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loaded => "loaded",
            Self::Probed => "probed",
            Self::Planned => "planned",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Halted => "halted",
        };
        f.write_str(s)
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, report change actions as skipped
    pub dry_run: bool,
    /// Behaviour after a failed action
    pub policy: FailurePolicy,
    /// Per-invocation timeout handed to the package manager
    pub timeout: Option<Duration>,
    /// Verbose output
    pub verbose: bool,
}
