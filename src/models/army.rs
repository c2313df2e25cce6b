//! Army and detachment models.

use serde::{Deserialize, Serialize};

use super::{ArmyId, DetachmentId, EntityId};

/// A faction a player fields, e.g. "Aeldari" or "Space Marines".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    /// Unique identifier
    pub id: ArmyId,

    /// Army name
    pub name: String,

    /// Soft-delete marker
    #[serde(default)]
    pub is_deleted: bool,
}

impl Army {
    /// Create an unsaved army.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::UNSAVED,
            name: name.into(),
            is_deleted: false,
        }
    }

    /// Builder method to set the ID.
    pub fn with_id(mut self, id: ArmyId) -> Self {
        self.id = id;
        self
    }
}

/// A named ruleset choice belonging to exactly one army.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detachment {
    /// Unique identifier
    pub id: DetachmentId,

    /// Detachment name
    pub name: String,

    /// Owning army; never changes after creation
    pub army_id: ArmyId,

    /// Soft-delete marker
    #[serde(default)]
    pub is_deleted: bool,
}

impl Detachment {
    /// Create an unsaved detachment for an army.
    pub fn new(army_id: ArmyId, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::UNSAVED,
            name: name.into(),
            army_id,
            is_deleted: false,
        }
    }

    /// Builder method to set the ID.
    pub fn with_id(mut self, id: DetachmentId) -> Self {
        self.id = id;
        self
    }
}

/// An army together with its detachments, the listing shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyWithDetachments {
    #[serde(flatten)]
    pub army: Army,
    pub detachments: Vec<Detachment>,
}

impl ArmyWithDetachments {
    /// Active detachment names, in listing order.
    pub fn active_detachment_names(&self) -> Vec<&str> {
        self.detachments
            .iter()
            .filter(|d| !d.is_deleted)
            .map(|d| d.name.as_str())
            .collect()
    }
}
