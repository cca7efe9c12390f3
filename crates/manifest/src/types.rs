//! Parsed manifest representation

use crate::error::Result;
use declarative::{ManifestRecord, PackageSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk manifest format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `[[package]]` tables
    Toml,
    /// Top-level array of records
    Json,
    /// `package "name" do ... end` blocks
    Recipe,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "rb" => Some(Self::Recipe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Recipe => "recipe",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared package plus where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub record: ManifestRecord,
    /// Comment heading the block this entry belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Source line, for recipes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Entry {
    pub fn new(record: ManifestRecord) -> Self {
        Self {
            record,
            group: None,
            line: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// A manifest file, entries in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub path: Option<PathBuf>,
    pub format: Format,
    pub entries: Vec<Entry>,
}

impl Manifest {
    pub fn new(format: Format) -> Self {
        Self {
            path: None,
            format,
            entries: Vec::new(),
        }
    }

    pub fn from_records(format: Format, records: impl IntoIterator<Item = ManifestRecord>) -> Self {
        Self {
            path: None,
            format,
            entries: records.into_iter().map(Entry::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw records, in order
    pub fn records(&self) -> impl Iterator<Item = &ManifestRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Group label for a package, if the source had one
    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .and_then(|e| e.group.as_deref())
    }

    /// Validate into specs
    pub fn to_specs(&self) -> Result<Vec<PackageSpec>> {
        Ok(declarative::load(self.records().cloned())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("dev.rb")), Some(Format::Recipe));
        assert_eq!(Format::from_path(Path::new("a/b.TOML")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("packages.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("Packagefile")), None);
        assert_eq!(Format::from_path(Path::new("x.yaml")), None);
    }

    #[test]
    fn test_to_specs_validates() {
        let manifest = Manifest::from_records(
            Format::Toml,
            vec![
                ManifestRecord::new("a", "installed"),
                ManifestRecord::new("a", "removed"),
            ],
        );
        assert!(matches!(
            manifest.to_specs(),
            Err(crate::Error::Manifest(
                declarative::ManifestError::DuplicateName { .. }
            ))
        ));
    }

    #[test]
    fn test_group_of() {
        let mut manifest = Manifest::new(Format::Recipe);
        let mut entry = Entry::new(ManifestRecord::new("clang", "installed"));
        entry.group = Some("Clang".into());
        manifest.entries.push(entry);

        assert_eq!(manifest.group_of("clang"), Some("Clang"));
        assert_eq!(manifest.group_of("make"), None);
    }
}
