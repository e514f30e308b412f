//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::expense::ExpenseCategory;

/// Represents a KCT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .kct/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let kct_dir = current.join(".kct");
            if kct_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open a project rooted at an explicit directory (no upward search)
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let root = root
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        if !root.join(".kct").is_dir() {
            return Err(ProjectError::NotFound {
                searched_from: root,
            });
        }
        Ok(Self { root })
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let kct_dir = root.join(".kct");
        if kct_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        Self::write_scaffold(&root)?;
        Ok(Self { root })
    }

    /// Force initialization even if .kct/ exists
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_scaffold(&root)?;
        Ok(Self { root })
    }

    fn write_scaffold(root: &Path) -> Result<(), ProjectError> {
        let kct_dir = root.join(".kct");
        std::fs::create_dir_all(&kct_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = kct_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(root)
    }

    fn default_config() -> &'static str {
        r#"# KCT Project Configuration

# Default author for new entities (can be overridden by global config)
# author: ""

# Editor to use for `kct` edit flows (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Pricing settings used by document previews and generation
pricing:
  # Markup applied to milestone cost when no per-milestone markup is set
  default_markup_percent: 30.0

  # Initial fee: percent of the fee base, clamped to [min, max].
  # When percent is omitted, 20% is assumed.
  # initial_fee_percent: 20.0
  # initial_fee_min: 0.0
  # initial_fee_max: null

  # Final inspection fee: percent of the fee base, clamped to [min, max].
  # When percent is omitted, 80% is assumed.
  # final_fee_percent: 80.0
  # final_fee_min: 0.0
  # final_fee_max: null

  # Scope-of-work auto-synthesis per expense category
  include_subcontractor_scope: true
  include_equipment_scope: true
  include_additional_scope: true
"#
    }

    fn create_entity_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = [
            "expenses/subcontractors",
            "expenses/equipment",
            "expenses/materials",
            "expenses/additional",
            "documents",
        ];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .kct configuration directory
    pub fn kct_dir(&self) -> PathBuf {
        self.root.join(".kct")
    }

    /// Directory holding generated document output
    pub fn generated_dir(&self) -> PathBuf {
        self.root.join("generated")
    }

    /// Get the path for a new entity file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &EntityId) -> PathBuf {
        let subdir = Self::entity_directory(prefix);
        self.root.join(subdir).join(format!("{}.kct.yaml", id))
    }

    /// Get the directory for a given entity prefix
    ///
    /// Milestones and scope items live inside their document file, so only
    /// expense and document prefixes map to directories. Expenses default to
    /// the additional-costs directory; use [`Project::expense_directory`] for
    /// category-correct placement.
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Exp => "expenses/additional",
            EntityPrefix::Doc => "documents",
            EntityPrefix::Ms | EntityPrefix::Sow => "documents",
        }
    }

    /// Get the directory for expenses of a specific category
    pub fn expense_directory(&self, category: ExpenseCategory) -> PathBuf {
        let subdir = match category {
            ExpenseCategory::SubcontractorFee => "expenses/subcontractors",
            ExpenseCategory::Equipment => "expenses/equipment",
            ExpenseCategory::Material => "expenses/materials",
            ExpenseCategory::Additional => "expenses/additional",
        };
        self.root.join(subdir)
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = match prefix {
            EntityPrefix::Exp => self.root.join("expenses"),
            _ => self.root.join(Self::entity_directory(prefix)),
        };
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(".kct.yaml"))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a KCT project (searched from {searched_from:?}). Run 'kct init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("KCT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.kct_dir().exists());
        assert!(project.kct_dir().join("config.yaml").exists());
        assert!(project.root().join("expenses/subcontractors").is_dir());
        assert!(project.root().join("expenses/equipment").is_dir());
        assert!(project.root().join("expenses/materials").is_dir());
        assert!(project.root().join("expenses/additional").is_dir());
        assert!(project.root().join("documents").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_kct_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_kct_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_expense_directories_by_category() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project
            .expense_directory(ExpenseCategory::SubcontractorFee)
            .ends_with("expenses/subcontractors"));
        assert!(project
            .expense_directory(ExpenseCategory::Material)
            .ends_with("expenses/materials"));
    }
}
