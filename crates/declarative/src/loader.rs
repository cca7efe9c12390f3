//! Manifest loader - raw records to validated package specs

use crate::error::ManifestError;
use crate::types::{DesiredState, PackageSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One untyped manifest record, as read from a file
///
/// Unknown fields are rejected so a typo like `stat = "installed"` fails
/// loudly instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestRecord {
    pub name: String,
    pub state: String,
}

impl ManifestRecord {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

/// Validate records into package specs, preserving order
///
/// Pure: no system access. Fails on the first empty name, invalid name,
/// duplicate name or unrecognized state.
pub fn load<I>(records: I) -> Result<Vec<PackageSpec>, ManifestError>
where
    I: IntoIterator<Item = ManifestRecord>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut specs = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let name = record.name.trim();

        if name.is_empty() {
            return Err(ManifestError::EmptyName { index });
        }
        if !is_valid_name(name) {
            return Err(ManifestError::InvalidName {
                index,
                name: record.name.clone(),
            });
        }
        if let Some(&first) = seen.get(name) {
            return Err(ManifestError::DuplicateName {
                name: name.to_string(),
                first,
                second: index,
            });
        }

        let desired = DesiredState::parse(&record.state).ok_or_else(|| {
            ManifestError::UnrecognizedState {
                name: name.to_string(),
                value: record.state.clone(),
            }
        })?;

        seen.insert(name.to_string(), index);
        specs.push(PackageSpec::new(name, desired));
    }

    log::debug!("loaded {} package specs", specs.len());
    Ok(specs)
}

/// Names go straight onto a package manager command line
fn is_valid_name(name: &str) -> bool {
    !name.starts_with('-') && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}
