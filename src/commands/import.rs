//! `pantry import` - convert a manifest (usually a Chef recipe) to TOML

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::EXIT_OK;
use std::path::Path;

use crate::Context;
use crate::cli::ImportArgs;
use crate::ui;

/// Refuse to clobber an existing file unless forced
fn check_output(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

pub fn run(ctx: &Context, args: &ImportArgs) -> Result<i32> {
    let (manifest, loaded) = super::load_manifest(&args.source)?;
    let count = loaded.specs().len();

    match &args.output {
        Some(path) => {
            check_output(path, args.force)?;
            manifest::writer::write_file(&manifest, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !ctx.quiet {
                ui::success(&format!(
                    "Imported {count} package(s) from {} to {}",
                    args.source.display(),
                    path.display()
                ));
            }
        }
        None => print!("{}", manifest::writer::write_string(&manifest)),
    }

    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RECIPE: &str = r#"
# Compilers
package "clang" do
  action :install
  version "3.4"
end

package "libkqueue0" do
  action :remove
end
"#;

    #[test]
    fn test_check_output_requires_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.toml");
        assert!(check_output(&path, false).is_ok());

        fs::write(&path, "").unwrap();
        assert!(check_output(&path, false).is_err());
        assert!(check_output(&path, true).is_ok());
    }

    #[test]
    fn test_import_recipe_to_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dev.rb");
        let output = dir.path().join("dev.toml");
        fs::write(&source, RECIPE).unwrap();

        let ctx = Context {
            verbose: 0,
            quiet: true,
            config: None,
        };
        let args = ImportArgs {
            source,
            output: Some(output.clone()),
            force: false,
        };
        assert_eq!(run(&ctx, &args).unwrap(), EXIT_OK);

        let specs = manifest::load_specs(&output).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name(), "clang");
        assert_eq!(specs[0].desired().to_string(), "pinned:3.4");
        assert_eq!(specs[1].desired().to_string(), "removed");

        // Second import without --force must not overwrite
        assert!(run(&ctx, &args).is_err());
    }
}
