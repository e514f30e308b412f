//! Entity identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Expense line item
    Exp,
    /// Payment milestone (embedded in a document)
    Ms,
    /// Scope-of-work item (embedded in a document)
    Sow,
    /// Document (contract, proposal, or change order)
    Doc,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Exp => "EXP",
            EntityPrefix::Ms => "MS",
            EntityPrefix::Sow => "SOW",
            EntityPrefix::Doc => "DOC",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Exp,
            EntityPrefix::Ms,
            EntityPrefix::Sow,
            EntityPrefix::Doc,
        ]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EXP" => Ok(EntityPrefix::Exp),
            "MS" => Ok(EntityPrefix::Ms),
            "SOW" => Ok(EntityPrefix::Sow),
            "DOC" => Ok(EntityPrefix::Doc),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Create an EntityId from a prefix and existing ULID
    pub fn from_parts(prefix: EntityPrefix, ulid: Ulid) -> Self {
        Self { prefix, ulid }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: EXP, MS, SOW, DOC)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}
