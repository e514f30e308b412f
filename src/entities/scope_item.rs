//! Scope-of-work item - one line of a document's scope description
//!
//! Auto-generated items carry one of the three fixed category titles and
//! are kept in sync by the synthesizer; anything else is user-owned text
//! the synthesizer never touches.

use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// A scope-of-work entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeItem {
    /// Unique identifier (SOW-...), generated locally
    pub id: EntityId,

    /// Item title; fixed category names mark synthesizer-owned items
    pub title: String,

    /// Body text (bullet lines for auto-generated items)
    #[serde(default)]
    pub description: String,

    /// True when the synthesizer owns this item's description
    #[serde(default)]
    pub auto_generated: bool,

    /// Position in the scope list (1-based)
    #[serde(default)]
    pub sequence: u32,
}

impl ScopeItem {
    /// Create a user-authored scope item
    pub fn manual(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Sow),
            title: title.into(),
            description: description.into(),
            auto_generated: false,
            sequence: 0,
        }
    }

    /// Create a synthesizer-owned scope item
    pub fn auto(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            auto_generated: true,
            ..Self::manual(title, description)
        }
    }
}
