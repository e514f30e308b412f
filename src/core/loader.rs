//! Entity loading utilities
//!
//! Generic helpers for reading and writing entity files, shared by the
//! command implementations.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::entities::expense::{ExpenseLineItem, ExpenseSheet};

/// Load all entities of type T from a directory
///
/// Scans the directory for .kct.yaml files and deserializes them.
/// Files that fail to parse are silently skipped.
pub fn load_all<T: DeserializeOwned + 'static>(dir: &Path) -> Result<Vec<T>> {
    let mut entities = Vec::new();

    if !dir.exists() {
        return Ok(entities);
    }

    for entry in fs::read_dir(dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if path.to_string_lossy().ends_with(".kct.yaml") {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(entity) = serde_yml::from_str::<T>(&content) {
                    entities.push(entity);
                }
            }
        }
    }

    Ok(entities)
}

/// Find an entity file by ID (supports partial matching)
///
/// Searches for a file whose stem contains the given ID.
/// Returns the first match found.
pub fn find_entity_file(dir: &Path, id: &str) -> Option<PathBuf> {
    if !dir.exists() {
        return None;
    }

    for entry in fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let path = entry.path();

        if path.to_string_lossy().ends_with(".kct.yaml") {
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if filename.contains(id) || filename.starts_with(id) {
                return Some(path);
            }
        }
    }

    None
}

/// Load a single entity by ID
///
/// Searches for an entity file matching the ID and deserializes it.
/// Returns the path and entity if found.
pub fn load_entity<T: DeserializeOwned + 'static>(dir: &Path, id: &str) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = find_entity_file(dir, id) {
        let entity: T = crate::yaml::parse_yaml_file(&path)?;
        return Ok(Some((path, entity)));
    }
    Ok(None)
}

/// Serialize an entity to its YAML file
pub fn save_entity<T: Serialize>(path: &Path, entity: &T) -> Result<()> {
    let yaml = serde_yml::to_string(entity).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    Ok(())
}

/// Load the project's full expense sheet across all four categories
///
/// Items are routed by their own category field, so a file sitting in the
/// wrong directory still lands in the right collection. Unparseable files
/// are skipped.
pub fn load_expense_sheet(project: &Project) -> Result<ExpenseSheet> {
    let mut sheet = ExpenseSheet::default();

    for path in project.iter_entity_files(EntityPrefix::Exp) {
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(item) = serde_yml::from_str::<ExpenseLineItem>(&content) {
                sheet.push(item);
            }
        }
    }

    Ok(sheet)
}
