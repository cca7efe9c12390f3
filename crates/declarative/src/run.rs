//! Run lifecycle: `Loaded → Probed → Planned → Executing → Completed | Halted`
//!
//! Each stage is its own type and consuming it yields the next, so steps
//! can't be skipped or repeated. `Executing` only exists inside
//! [`PlannedRun::execute`].

use crate::context::{CancelToken, ConfirmCallback, PackageManager, ProgressCallback};
use crate::error::{ManifestError, ProbeError};
use crate::executor::execute;
use crate::loader::{self, ManifestRecord};
use crate::planner::{Plan, build_plan};
use crate::probe::probe_all;
use crate::report::{EXIT_CANCELLED, RunSummary};
use crate::types::{ActionResult, ExecuteOptions, PackageSpec, ProbedState, RunState};
use serde::{Deserialize, Serialize};

/// A manifest that passed validation
#[derive(Debug, Clone)]
pub struct LoadedRun {
    specs: Vec<PackageSpec>,
}

impl LoadedRun {
    pub fn new(specs: Vec<PackageSpec>) -> Self {
        log::debug!("run state: {}", RunState::Loaded);
        Self { specs }
    }

    /// Validate raw records and start a run
    pub fn from_records<I>(records: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = ManifestRecord>,
    {
        Ok(Self::new(loader::load(records)?))
    }

    pub fn state(&self) -> RunState {
        RunState::Loaded
    }

    pub fn specs(&self) -> &[PackageSpec] {
        &self.specs
    }

    /// Query the system for every spec
    pub fn probe<M>(self, manager: &M) -> Result<ProbedRun, ProbeError>
    where
        M: PackageManager + ?Sized,
    {
        let probed = probe_all(manager, &self.specs)?;
        log::debug!("run state: {}", RunState::Probed);
        Ok(ProbedRun {
            specs: self.specs,
            probed,
        })
    }
}

/// Specs joined with fresh ground truth
#[derive(Debug, Clone)]
pub struct ProbedRun {
    specs: Vec<PackageSpec>,
    probed: Vec<ProbedState>,
}

impl ProbedRun {
    pub fn state(&self) -> RunState {
        RunState::Probed
    }

    pub fn specs(&self) -> &[PackageSpec] {
        &self.specs
    }

    pub fn probed(&self) -> &[ProbedState] {
        &self.probed
    }

    pub fn plan(self) -> PlannedRun {
        let plan = build_plan(&self.specs, &self.probed);
        let summary = plan.summary();
        log::debug!(
            "run state: {} ({} install, {} remove, {} upgrade, {} noop)",
            RunState::Planned,
            summary.install,
            summary.remove,
            summary.upgrade,
            summary.noop
        );
        PlannedRun { plan }
    }
}

/// A plan ready to execute
#[derive(Debug, Clone)]
pub struct PlannedRun {
    plan: Plan,
}

impl PlannedRun {
    pub fn state(&self) -> RunState {
        RunState::Planned
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }

    /// Apply the plan and aggregate the outcome
    pub fn execute<M, P, C>(
        self,
        manager: &M,
        opts: &ExecuteOptions,
        progress: &mut P,
        confirm: &mut C,
        cancel: &CancelToken,
    ) -> RunReport
    where
        M: PackageManager + ?Sized,
        P: ProgressCallback + ?Sized,
        C: ConfirmCallback + ?Sized,
    {
        log::debug!("run state: {}", RunState::Executing);
        let execution = execute(self.plan, manager, opts, progress, confirm, cancel);
        let state = execution.state();
        log::debug!("run state: {state}");

        RunReport {
            manager: manager.name().to_string(),
            state,
            summary: RunSummary::from_results(&execution.results),
            results: execution.results,
            cancelled: execution.cancelled,
            declined: execution.declined,
            dry_run: opts.dry_run,
        }
    }
}

/// Final record of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub manager: String,
    pub state: RunState,
    pub summary: RunSummary,
    pub results: Vec<ActionResult>,
    pub cancelled: bool,
    pub declined: bool,
    pub dry_run: bool,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        if self.cancelled && self.state != RunState::Halted {
            EXIT_CANCELLED
        } else {
            self.summary.exit_code(self.state)
        }
    }
}

/// Probe, plan and execute in one call
pub fn run<M, P, C>(
    specs: Vec<PackageSpec>,
    manager: &M,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
    cancel: &CancelToken,
) -> Result<RunReport, ProbeError>
where
    M: PackageManager + ?Sized,
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback + ?Sized,
{
    let planned = LoadedRun::new(specs).probe(manager)?.plan();
    Ok(planned.execute(manager, opts, progress, confirm, cancel))
}
