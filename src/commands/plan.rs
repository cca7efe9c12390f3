//! `pantry plan` - show what apply would change

use anyhow::{Context as AnyhowContext, Result};
use declarative::{EXIT_OK, PackageManager, Plan, PlanSummary};
use serde::Serialize;

use crate::Context;
use crate::cli::{OutputFormat, PlanArgs};
use crate::config::Settings;
use crate::{render, ui};

#[derive(Serialize)]
struct JsonPlan<'a> {
    manager: &'a str,
    summary: PlanSummary,
    #[serde(flatten)]
    plan: &'a Plan,
}

pub fn run(ctx: &Context, args: PlanArgs) -> Result<i32> {
    let json = args.format == OutputFormat::Json;
    let settings = Settings::load(ctx.config.as_deref())?;

    let (manifest, loaded) = super::load_manifest(&args.manifest)?;
    let client = super::client(&settings, &args.backend)?;
    let planned = super::probe(loaded, &client, !json)?.plan();
    let plan = planned.plan();

    if json {
        let out = JsonPlan {
            manager: client.name(),
            summary: plan.summary(),
            plan,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialize plan")?
        );
        return Ok(EXIT_OK);
    }

    ui::header(&format!("Plan for {}", args.manifest.display()));
    render::print_plan(plan, &manifest, ctx.verbose > 0 || !plan.has_changes());
    if plan.has_changes() && !ctx.quiet {
        println!();
        ui::dim(&format!(
            "Run `pantry apply {}` to make these changes",
            args.manifest.display()
        ));
    }

    Ok(EXIT_OK)
}
