//! Child-collection reconciliation.
//!
//! Given the children a parent currently owns and the list the caller wants it
//! to own, work out which rows to rename, which to create and which to
//! soft-delete. Nothing here touches storage: the result is a write-set that
//! the persistence layer applies as a unit.
//!
//! Removed children are only ever soft-deleted so that match history pointing
//! at them keeps resolving.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Army, ArmyId, Detachment, EntityId};

/// Errors for malformed edit lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Edit references child {0}, which the parent does not own")]
    UnknownChildId(EntityId),

    #[error("Child {0} appears more than once in the edit list")]
    DuplicateChildId(EntityId),
}

/// A child row that can take part in reconciliation.
pub trait Child {
    /// Stored identity of the child.
    fn child_id(&self) -> EntityId;

    /// Soft-deleted children are invisible to reconciliation.
    fn is_active(&self) -> bool {
        true
    }
}

impl Child for Detachment {
    fn child_id(&self) -> EntityId {
        self.id
    }

    fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Desired state of one child. No ID (or ID zero) means "create".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
}

impl ChildEdit {
    /// Keep (and possibly rename) an existing child.
    pub fn existing(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Add a new child.
    pub fn new_child(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    fn persisted_id(&self) -> Option<EntityId> {
        self.id.filter(|id| id.is_persisted())
    }
}

/// Rename of an existing child. Issued even when the name is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildUpdate {
    pub id: EntityId,
    pub name: String,
}

/// A child to be created and linked to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCreate {
    pub name: String,
}

/// Write-set produced by [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub to_update: Vec<ChildUpdate>,
    pub to_create: Vec<ChildCreate>,
    pub to_soft_delete: Vec<EntityId>,
}

impl ReconcilePlan {
    /// IDs of existing children that the plan keeps.
    pub fn kept_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.to_update.iter().map(|u| u.id)
    }

    /// Total number of writes the plan will issue.
    pub fn write_count(&self) -> usize {
        self.to_update.len() + self.to_create.len() + self.to_soft_delete.len()
    }
}

/// Compute the write-set that moves `existing` to `incoming`.
///
/// Every active ID in `existing` ends up in exactly one of `to_update` or
/// `to_soft_delete`. Edits without a persisted ID always land in `to_create`.
pub fn reconcile<C: Child>(
    existing: &[C],
    incoming: &[ChildEdit],
) -> Result<ReconcilePlan, ReconcileError> {
    let active: HashSet<EntityId> = existing
        .iter()
        .filter(|c| c.is_active())
        .map(Child::child_id)
        .collect();

    let mut plan = ReconcilePlan::default();
    let mut incoming_ids = HashSet::new();

    for edit in incoming {
        match edit.persisted_id() {
            Some(id) => {
                if !active.contains(&id) {
                    return Err(ReconcileError::UnknownChildId(id));
                }
                if !incoming_ids.insert(id) {
                    return Err(ReconcileError::DuplicateChildId(id));
                }
                plan.to_update.push(ChildUpdate {
                    id,
                    name: edit.name.clone(),
                });
            }
            None => plan.to_create.push(ChildCreate {
                name: edit.name.clone(),
            }),
        }
    }

    let mut seen = HashSet::new();
    plan.to_soft_delete = existing
        .iter()
        .filter(|c| c.is_active())
        .map(Child::child_id)
        .filter(|id| !incoming_ids.contains(id) && seen.insert(*id))
        .collect();

    Ok(plan)
}

/// Desired state of an army: its own name plus the full detachment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyEdit {
    pub name: String,
    #[serde(default)]
    pub detachments: Vec<ChildEdit>,
}

/// Everything an army edit writes. Applied all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyUpdatePlan {
    pub army_id: ArmyId,
    pub name: String,
    pub detachments: ReconcilePlan,
}

/// Plan an army edit against the army's current detachments.
///
/// Detachments owned by other armies are ignored, so naming one in the edit
/// is reported as an unknown child rather than re-parenting it.
pub fn plan_army_update(
    army: &Army,
    existing: &[Detachment],
    edit: &ArmyEdit,
) -> Result<ArmyUpdatePlan, ReconcileError> {
    let owned: Vec<&Detachment> = existing.iter().filter(|d| d.army_id == army.id).collect();
    let detachments = reconcile(&owned, &edit.detachments)?;

    Ok(ArmyUpdatePlan {
        army_id: army.id,
        name: edit.name.clone(),
        detachments,
    })
}

impl<C: Child> Child for &C {
    fn child_id(&self) -> EntityId {
        (*self).child_id()
    }

    fn is_active(&self) -> bool {
        (*self).is_active()
    }
}
