//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::Project;

/// Pricing settings consumed by the pricing engine
///
/// Fee percent fields are optional: an absent percent falls back to the
/// engine's documented defaults (20% initial / 80% final). Min/max clamp
/// bounds default to 0 and unbounded respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Markup applied to milestone cost when the milestone has none of its own
    pub default_markup_percent: f64,

    /// Initial fee as a percent of the fee base
    pub initial_fee_percent: Option<f64>,
    /// Lower clamp for the initial fee amount
    pub initial_fee_min: Option<f64>,
    /// Upper clamp for the initial fee amount
    pub initial_fee_max: Option<f64>,

    /// Final inspection fee as a percent of the fee base
    pub final_fee_percent: Option<f64>,
    /// Lower clamp for the final fee amount
    pub final_fee_min: Option<f64>,
    /// Upper clamp for the final fee amount
    pub final_fee_max: Option<f64>,

    /// Synthesize a "Subcontractor Work" scope item from subcontractor fees
    pub include_subcontractor_scope: bool,
    /// Synthesize an "Equipment & Materials" scope item
    pub include_equipment_scope: bool,
    /// Synthesize an "Additional Services" scope item
    pub include_additional_scope: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_markup_percent: 30.0,
            initial_fee_percent: None,
            initial_fee_min: None,
            initial_fee_max: None,
            final_fee_percent: None,
            final_fee_min: None,
            final_fee_max: None,
            include_subcontractor_scope: true,
            include_equipment_scope: true,
            include_additional_scope: true,
        }
    }
}

/// KCT configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new entities
    pub author: Option<String>,

    /// Editor command for edit flows
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Pricing settings (company settings in the project config)
    pub pricing: Option<PricingConfig>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/kct/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Project config (.kct/config.yaml)
        if let Ok(project) = Project::discover() {
            let project_config_path = project.kct_dir().join("config.yaml");
            if project_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&project_config_path) {
                    if let Ok(project_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(project_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("KCT_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("KCT_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "kct")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.pricing.is_some() {
            self.pricing = other.pricing;
        }
    }

    /// Effective pricing settings (built-in defaults when unset)
    pub fn pricing(&self) -> PricingConfig {
        self.pricing.clone().unwrap_or_default()
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        // Try git config
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        // Fall back to username
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}
