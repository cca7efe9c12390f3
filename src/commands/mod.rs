//! Subcommand implementations
//!
//! Each command returns the process exit code; errors bubble up as
//! `anyhow::Error` and map to the fatal exit code in `main`.

pub mod apply;
pub mod config;
pub mod import;
pub mod plan;
pub mod status;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{LoadedRun, PackageManager, ProbedRun};
use manifest::Manifest;
use pkgkit::{BackendKind, BackendOptions, Client};
use std::path::Path;

use crate::cli::BackendArgs;
use crate::config::Settings;
use crate::progress;
use crate::sudo;

/// Load a manifest and resolve its desired states
pub fn load_manifest(path: &Path) -> Result<(Manifest, LoadedRun)> {
    let manifest = manifest::load_file(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;
    let specs = manifest
        .to_specs()
        .with_context(|| format!("Invalid manifest {}", path.display()))?;
    log::info!(
        "loaded {} package(s) from {} ({})",
        specs.len(),
        path.display(),
        manifest.format
    );
    Ok((manifest, LoadedRun::new(specs)))
}

/// Build a package manager client from settings and flags
pub fn client(settings: &Settings, args: &BackendArgs) -> Result<Client> {
    let kind = args.backend.map_or(settings.backend, BackendKind::from);
    let options = BackendOptions {
        sudo: sudo::wants_sudo(settings.sudo, sudo::is_root()),
    };
    let client = Client::new(kind, options)
        .with_context(|| format!("No usable package manager for backend '{kind}'"))?
        .with_retry(settings.retry.to_config());
    log::debug!("using {} backend", client.name());
    Ok(client)
}

/// Query the current state of every package
pub fn probe(run: LoadedRun, client: &Client, show_spinner: bool) -> Result<ProbedRun> {
    let count = run.specs().len();
    let pb = show_spinner
        .then(|| progress::spinner(&format!("Querying {count} package(s) with {}...", client.name())));

    let probed = run.probe(client);

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    probed.context("Failed to query installed packages")
}
