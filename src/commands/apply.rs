//! `pantry apply` - converge the system to a manifest

use anyhow::{Context as AnyhowContext, Result};
use chrono::{DateTime, Utc};
use declarative::{CancelToken, ExecuteOptions, PackageManager, RunReport};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::Context;
use crate::cli::{ApplyArgs, OutputFormat};
use crate::config::Settings;
use crate::progress::{Mode, TerminalProgress};
use crate::render;
use crate::ui::{self, ApplyGate};

/// Report written by `--format json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    manifest: &'a Path,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    exit_code: i32,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Merge settings with command-line overrides
fn options(settings: &Settings, args: &ApplyArgs, verbose: bool) -> ExecuteOptions {
    ExecuteOptions {
        dry_run: args.dry_run,
        policy: args.policy.map_or(settings.policy, Into::into),
        timeout: match args.timeout {
            Some(0) => None,
            Some(secs) => Some(std::time::Duration::from_secs(secs)),
            None => settings.timeout(),
        },
        verbose,
    }
}

/// Write the machine-readable report; the only thing on stdout in JSON mode
fn write_json<W: Write>(
    out: &mut W,
    manifest: &Path,
    started_at: DateTime<Utc>,
    report: &RunReport,
) -> Result<()> {
    let json = JsonReport {
        manifest,
        started_at,
        finished_at: Utc::now(),
        exit_code: report.exit_code(),
        report,
    };
    serde_json::to_writer_pretty(&mut *out, &json).context("Failed to serialize report")?;
    writeln!(out).context("Failed to write report")?;
    Ok(())
}

fn install_ctrlc(cancel: &CancelToken) {
    let token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("  Cancelling after the current package...");
        token.cancel();
    }) {
        log::warn!("could not install Ctrl-C handler: {e}");
    }
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<i32> {
    let started_at = Utc::now();
    let json = args.format == OutputFormat::Json;
    let text = !json && !ctx.quiet;

    let settings = Settings::load(ctx.config.as_deref())?;
    let opts = options(&settings, &args, ctx.verbose > 0);
    log::debug!(
        "policy={} timeout={:?} dry_run={}",
        opts.policy,
        opts.timeout,
        opts.dry_run
    );

    let (manifest, loaded) = super::load_manifest(&args.manifest)?;
    let client = super::client(&settings, &args.backend)?;

    if text {
        ui::header(&format!("Applying {}", args.manifest.display()));
        ui::kv("Backend", client.name());
        ui::kv("Packages", &manifest.len().to_string());
        ui::kv("On failure", &opts.policy.to_string());
        if opts.dry_run {
            println!();
            ui::info("Dry run: nothing will be changed");
        }
    }

    let planned = super::probe(loaded, &client, text)?.plan();
    if text {
        render::print_plan(planned.plan(), &manifest, ctx.verbose > 0);
    }

    let cancel = CancelToken::new();
    install_ctrlc(&cancel);

    let mut gate = ApplyGate::new(args.yes || opts.dry_run);
    if client.needs_privileges() && crate::sudo::wants_sudo(settings.sudo, crate::sudo::is_root())
    {
        gate = gate.with_sudo(format!("{} needs root to change packages", client.name()));
    }
    let mut progress = TerminalProgress::new(Mode::detect(!text));

    let report = planned.execute(&client, &opts, &mut progress, &mut gate, &cancel);
    let code = report.exit_code();
    log::info!("run finished in state {} with exit code {code}", report.state);

    if json {
        write_json(&mut io::stdout().lock(), &args.manifest, started_at, &report)?;
    } else if !ctx.quiet {
        render::print_summary(&report);
    }

    Ok(code)
}
