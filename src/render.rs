//! Human-readable plan, status and summary output

use colored::Colorize;
use declarative::{
    ActionKind, CurrentState, DesiredState, PackageSpec, Plan, PlanAction, ProbedState, RunReport,
    RunState,
};
use manifest::Manifest;

use crate::ui;

/// One plan line, e.g. `~ upgrade clang 3.0 → 3.4`
pub fn plan_line(action: &PlanAction) -> String {
    let name = action.name();
    let current = action.probed.current.version();

    match action.kind {
        ActionKind::Install => match action.target_version() {
            Some(v) => format!("{} install {} {}", "+".green(), name, v.dimmed()),
            None => format!("{} install {}", "+".green(), name),
        },
        ActionKind::Remove => match current {
            Some(v) => format!("{} remove {} {}", "-".red(), name, v.dimmed()),
            None => format!("{} remove {}", "-".red(), name),
        },
        ActionKind::Upgrade => format!(
            "{} upgrade {} {} → {}",
            "~".yellow(),
            name,
            current.unwrap_or("?").dimmed(),
            action.target_version().unwrap_or("?")
        ),
        ActionKind::Noop => match current {
            Some(v) => format!("{} {} {}", "=".dimmed(), name.dimmed(), v.dimmed()),
            None => format!("{} {} {}", "=".dimmed(), name.dimmed(), "absent".dimmed()),
        },
    }
}

/// Print the plan grouped by manifest section
pub fn print_plan(plan: &Plan, manifest: &Manifest, show_noop: bool) {
    let mut group: Option<&str> = None;

    for action in &plan.actions {
        if !show_noop && !action.kind.is_change() {
            continue;
        }
        let this_group = manifest.group_of(action.name());
        if this_group.is_some() && this_group != group {
            ui::section(this_group.unwrap_or_default());
            group = this_group;
        }
        println!("  {}", plan_line(action));
    }

    let summary = plan.summary();
    println!();
    if summary.changes() == 0 {
        ui::success(&format!(
            "Nothing to do, {} package(s) already converged",
            summary.noop
        ));
    } else {
        println!(
            "  {} {} to install, {} to remove, {} to upgrade, {} unchanged",
            "Plan:".bold(),
            summary.install.to_string().green(),
            summary.remove.to_string().red(),
            summary.upgrade.to_string().yellow(),
            summary.noop
        );
    }
}

/// Whether the current state already satisfies the desired one
pub fn in_sync(desired: &DesiredState, current: &CurrentState) -> bool {
    declarative::action_kind(desired, current) == ActionKind::Noop
}

/// Print desired vs current per package
pub fn print_status(specs: &[PackageSpec], probed: &[ProbedState]) {
    let width = specs.iter().map(|s| s.name().len()).max().unwrap_or(0).max(7);

    println!(
        "  {:<width$}  {:<16}  {:<16}",
        "PACKAGE".bold(),
        "DESIRED".bold(),
        "CURRENT".bold()
    );

    let mut drift = 0;
    for spec in specs {
        let current = probed
            .iter()
            .find(|p| p.name == spec.name())
            .map_or(CurrentState::Absent, |p| p.current.clone());
        let ok = in_sync(spec.desired(), &current);
        if !ok {
            drift += 1;
        }
        let mark = if ok { "✓".green() } else { "✗".red() };
        println!(
            "  {:<width$}  {:<16}  {:<16} {}",
            spec.name(),
            spec.desired().to_string(),
            current.to_string(),
            mark
        );
    }

    println!();
    if drift == 0 {
        ui::success(&format!("All {} package(s) in desired state", specs.len()));
    } else {
        ui::warn(&format!("{drift} of {} package(s) drifted", specs.len()));
    }
}

/// Print the final counts and first failure
pub fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!();

    if report.cancelled {
        println!("  {} Cancelled", "⊘".yellow().bold());
    } else if report.state == RunState::Halted {
        println!("  {} Halted after a failure", "✗".red().bold());
    } else if report.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if report.declined {
        println!("  {} No changes made", "ℹ".blue());
    } else if summary.is_success() {
        println!("  {} Packages converged", "✓".green().bold());
    } else {
        println!("  {} Applied with errors", "⚠".yellow().bold());
    }

    if summary.installed > 0 {
        println!("    • {} installed", summary.installed);
    }
    if summary.upgraded > 0 {
        println!("    • {} upgraded", summary.upgraded);
    }
    if summary.removed > 0 {
        println!("    • {} removed", summary.removed);
    }
    if summary.unchanged > 0 {
        println!("    • {} unchanged", summary.unchanged);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }

    if let Some(first) = &summary.first_failure {
        println!();
        ui::kv(
            "First failure",
            &format!("{} {}: {}", first.action, first.package, first.reason),
        );
    }
}
