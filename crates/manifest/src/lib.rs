//! # manifest
//!
//! Package manifest files for pantry.
//!
//! A manifest is an ordered list of `{ name, state }` records. Three formats
//! are read, chosen by extension:
//!
//! - `.toml`: `[[package]]` tables
//! - `.json`: a top-level array of records
//! - `.rb`: Chef-style `package "name" do ... end` recipes
//!
//! Unknown fields are rejected in TOML and JSON. Validation into
//! [`declarative::PackageSpec`]s happens in [`Manifest::to_specs`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let manifest = manifest::load_file(Path::new("packages.toml")).unwrap();
//! let specs = manifest.to_specs().unwrap();
//! println!("{} packages", specs.len());
//! ```

pub mod error;
pub mod recipe;
pub mod types;
pub mod writer;

pub use error::{Error, Result};
pub use types::{Entry, Format, Manifest};

use declarative::{ManifestRecord, PackageSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// TOML document shape
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlManifest {
    #[serde(default, rename = "package")]
    packages: Vec<ManifestRecord>,
}

/// Read a manifest, picking the parser from the file extension.
pub fn load_file(path: &Path) -> Result<Manifest> {
    let format =
        Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let mut manifest = parse_str(&content, format)?;
    manifest.path = Some(path.to_path_buf());

    log::debug!(
        "loaded {} {} entries from {}",
        manifest.len(),
        format,
        path.display()
    );
    Ok(manifest)
}

/// Parse manifest text in the given format.
pub fn parse_str(content: &str, format: Format) -> Result<Manifest> {
    match format {
        Format::Toml => {
            let doc: TomlManifest = toml::from_str(content)?;
            Ok(Manifest::from_records(format, doc.packages))
        }
        Format::Json => {
            let records: Vec<ManifestRecord> = serde_json::from_str(content)?;
            Ok(Manifest::from_records(format, records))
        }
        Format::Recipe => recipe::parse_string(content),
    }
}

/// Read and validate a manifest in one step.
pub fn load_specs(path: &Path) -> Result<Vec<PackageSpec>> {
    load_file(path)?.to_specs()
}
