//! `pantry validate` - check a manifest offline

use anyhow::Result;
use declarative::{DesiredState, EXIT_OK};
use std::path::Path;

use crate::Context;
use crate::ui;

/// Counts by desired state
#[derive(Debug, Default, PartialEq, Eq)]
struct Counts {
    installed: usize,
    removed: usize,
    pinned: usize,
}

fn count<'a>(states: impl IntoIterator<Item = &'a DesiredState>) -> Counts {
    let mut counts = Counts::default();
    for state in states {
        match state {
            DesiredState::Installed => counts.installed += 1,
            DesiredState::Removed => counts.removed += 1,
            DesiredState::Pinned(_) => counts.pinned += 1,
        }
    }
    counts
}

pub fn run(ctx: &Context, path: &Path) -> Result<i32> {
    let (manifest, loaded) = super::load_manifest(path)?;
    if ctx.quiet {
        return Ok(EXIT_OK);
    }

    let counts = count(loaded.specs().iter().map(|s| s.desired()));
    ui::success(&format!(
        "{} is valid ({} package(s), {})",
        path.display(),
        loaded.specs().len(),
        manifest.format
    ));
    ui::kv("installed", &counts.installed.to_string());
    ui::kv("pinned", &counts.pinned.to_string());
    ui::kv("removed", &counts.removed.to_string());

    Ok(EXIT_OK)
}
