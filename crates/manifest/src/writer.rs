//! Writer for TOML manifests.
//!
//! Output keeps declaration order and turns group labels into comment
//! headers, so an imported recipe keeps its sections.

use crate::types::Manifest;
use std::fmt::Write;
use std::path::Path;

/// Write a manifest to a TOML file.
pub fn write_file(manifest: &Manifest, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, write_string(manifest))
}

/// Render a manifest as TOML.
pub fn write_string(manifest: &Manifest) -> String {
    let mut output = String::new();
    let mut current_group: Option<&str> = None;

    for (i, entry) in manifest.entries.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        let group = entry.group.as_deref();
        if group != current_group {
            if let Some(label) = group {
                let _ = writeln!(output, "# {label}");
            }
            current_group = group;
        }

        let _ = writeln!(output, "[[package]]");
        let _ = writeln!(output, "name = {}", quote(&entry.record.name));
        let _ = writeln!(output, "state = {}", quote(&entry.record.state));
    }

    output
}

fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
