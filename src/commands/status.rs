//! `pantry status` - desired vs installed state per package

use anyhow::{Context as AnyhowContext, Result};
use declarative::{CurrentState, DesiredState, EXIT_OK, PackageManager};
use serde::Serialize;

use crate::Context;
use crate::cli::{OutputFormat, PlanArgs};
use crate::config::Settings;
use crate::{render, ui};

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    name: &'a str,
    desired: &'a DesiredState,
    current: &'a CurrentState,
    in_sync: bool,
}

pub fn run(ctx: &Context, args: PlanArgs) -> Result<i32> {
    let json = args.format == OutputFormat::Json;
    let settings = Settings::load(ctx.config.as_deref())?;

    let (_manifest, loaded) = super::load_manifest(&args.manifest)?;
    let client = super::client(&settings, &args.backend)?;
    let probed = super::probe(loaded, &client, !json)?;

    if json {
        let rows: Vec<StatusRow<'_>> = probed
            .specs()
            .iter()
            .zip(probed.probed())
            .map(|(spec, state)| StatusRow {
                name: spec.name(),
                desired: spec.desired(),
                current: &state.current,
                in_sync: render::in_sync(spec.desired(), &state.current),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("Failed to serialize status")?
        );
        return Ok(EXIT_OK);
    }

    ui::header(&format!("Status ({})", client.name()));
    render::print_status(probed.specs(), probed.probed());
    Ok(EXIT_OK)
}
