//! State prober - read-only inspection of the target system

use crate::context::PackageManager;
use crate::error::ProbeError;
use crate::types::{PackageSpec, ProbedState};

/// Query the installed state of every spec, in manifest order
///
/// Each package is queried exactly once. The first [`ProbeError`] aborts the
/// probe; no planning can happen without ground truth.
pub fn probe_all<M>(manager: &M, specs: &[PackageSpec]) -> Result<Vec<ProbedState>, ProbeError>
where
    M: PackageManager + ?Sized,
{
    specs.iter().map(|spec| probe_one(manager, spec)).collect()
}

/// Query one package
pub fn probe_one<M>(manager: &M, spec: &PackageSpec) -> Result<ProbedState, ProbeError>
where
    M: PackageManager + ?Sized,
{
    let current = match spec.desired().version() {
        Some(version) => manager.query_pinned(spec.name(), version)?,
        None => manager.query(spec.name())?,
    };
    log::debug!("{}: {} reports {}", spec.name(), manager.name(), current);
    Ok(ProbedState {
        name: spec.name().to_string(),
        current,
    })
}
