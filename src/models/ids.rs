//! Numeric entity identifiers assigned by the persistence layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted entity ID. Zero means the entity has not been stored yet.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The "not yet persisted" sentinel.
    pub const UNSAVED: EntityId = EntityId(0);

    /// Create a new EntityId from a raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Whether this ID refers to a stored row.
    pub fn is_persisted(&self) -> bool {
        self.0 != 0
    }

    /// The ID following this one, used when handing out fresh IDs.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Type alias for army IDs
pub type ArmyId = EntityId;

/// Type alias for detachment IDs
pub type DetachmentId = EntityId;

/// Type alias for match IDs
pub type MatchId = EntityId;
