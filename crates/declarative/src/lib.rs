//! # Declarative
//!
//! An engine for declarative package provisioning.
//!
//! This crate loads a manifest of desired package states, probes the target
//! system, computes an ordered plan and applies it through a package manager.
//!
//! ## Core Concepts
//!
//! - **PackageSpec**: a package name plus its desired state (installed, removed, pinned)
//! - **ProbedState**: what the package manager reports right now
//! - **Plan**: one action per spec, in manifest order
//! - **Executor**: applies the plan with a halt or continue failure policy
//! - **RunSummary**: counts and first failure, mapped to an exit code
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     AutoConfirm, CancelToken, ExecuteOptions, LoadedRun, ManifestRecord, NoProgress,
//! };
//!
//! let run = LoadedRun::from_records(vec![
//!     ManifestRecord::new("libssl-dev", "installed"),
//!     ManifestRecord::new("clang", "pinned:3.4"),
//! ])?;
//!
//! let planned = run.probe(&manager)?.plan();
//! let report = planned.execute(
//!     &manager,
//!     &ExecuteOptions::default(),
//!     &mut NoProgress,
//!     &mut AutoConfirm,
//!     &CancelToken::new(),
//! );
//! std::process::exit(report.exit_code());
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`PackageManager`]: query, install and remove packages
//! - [`ProgressCallback`]: receives progress updates
//! - [`ConfirmCallback`]: handles user confirmation before mutation
//!
//! Execution is strictly sequential; the package manager owns any locking.

pub mod context;
pub mod error;
pub mod executor;
pub mod loader;
pub mod planner;
pub mod probe;
pub mod report;
pub mod run;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, CancelToken, ConfirmCallback, NoProgress,
    PackageManager, ProgressCallback,
};
pub use error::{ExecutionError, ManifestError, ProbeError};
pub use executor::{Execution, execute, execute_simple};
pub use loader::{ManifestRecord, load};
pub use planner::{Plan, PlanSummary, action_kind, build_plan};
pub use probe::probe_all;
pub use report::{
    EXIT_CANCELLED, EXIT_FAILURES, EXIT_FATAL, EXIT_HALTED, EXIT_OK, FailureDetail, RunSummary,
};
pub use run::{LoadedRun, PlannedRun, ProbedRun, RunReport, run};
pub use types::{
    ActionKind, ActionResult, CurrentState, DesiredState, ExecuteOptions, FailurePolicy, Outcome,
    PackageSpec, PlanAction, ProbedState, RunState,
};
