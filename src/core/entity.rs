//! Entity trait - common interface for file-backed entity types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityId;

/// Common trait for KCT entities that live in their own YAML file
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix (e.g., "EXP", "DOC")
    const PREFIX: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the entity's display title
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}
