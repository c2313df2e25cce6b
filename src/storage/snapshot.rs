//! The full ledger state and every mutation the write paths perform on it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::StorageError;
use crate::models::{
    Army, ArmyId, ArmyWithDetachments, Detachment, DetachmentId, EntityId, Match, MatchId,
    NamedRef, ResolvedMatch,
};
use crate::reconcile::ArmyUpdatePlan;

/// Everything the ledger stores. Soft-deleted rows stay in the vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub armies: Vec<Army>,
    pub detachments: Vec<Detachment>,
    pub matches: Vec<Match>,
}

/// Next free ID after the highest one in use.
fn next_id(ids: impl Iterator<Item = EntityId>) -> EntityId {
    ids.max().unwrap_or(EntityId::UNSAVED).next()
}

impl LedgerSnapshot {
    pub fn next_army_id(&self) -> ArmyId {
        next_id(self.armies.iter().map(|a| a.id))
    }

    pub fn next_detachment_id(&self) -> DetachmentId {
        next_id(self.detachments.iter().map(|d| d.id))
    }

    pub fn next_match_id(&self) -> MatchId {
        next_id(self.matches.iter().map(|m| m.id))
    }

    // ------------------------------------------------------------------
    // Armies and detachments
    // ------------------------------------------------------------------

    /// Look up an army by ID, deleted or not.
    pub fn army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.iter().find(|a| a.id == id)
    }

    /// Look up an army that has not been soft-deleted.
    pub fn active_army(&self, id: ArmyId) -> Option<&Army> {
        self.army(id).filter(|a| !a.is_deleted)
    }

    fn army_mut(&mut self, id: ArmyId) -> Result<&mut Army, StorageError> {
        self.armies
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StorageError::ArmyNotFound(id))
    }

    /// Look up a detachment by ID, deleted or not.
    pub fn detachment(&self, id: DetachmentId) -> Option<&Detachment> {
        self.detachments.iter().find(|d| d.id == id)
    }

    fn detachment_mut(&mut self, id: DetachmentId) -> Result<&mut Detachment, StorageError> {
        self.detachments
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StorageError::DetachmentNotFound(id))
    }

    /// Every detachment an army has ever owned.
    pub fn detachments_of(&self, army_id: ArmyId) -> Vec<Detachment> {
        self.detachments
            .iter()
            .filter(|d| d.army_id == army_id)
            .cloned()
            .collect()
    }

    /// Detachments of an army that reconciliation should treat as existing.
    pub fn active_detachments(&self, army_id: ArmyId) -> Vec<Detachment> {
        self.detachments
            .iter()
            .filter(|d| d.army_id == army_id && !d.is_deleted)
            .cloned()
            .collect()
    }

    /// Active armies by name, each with its active detachments by name.
    pub fn active_armies(&self) -> Vec<ArmyWithDetachments> {
        let mut armies: Vec<ArmyWithDetachments> = self
            .armies
            .iter()
            .filter(|a| !a.is_deleted)
            .map(|army| {
                let mut detachments = self.active_detachments(army.id);
                detachments.sort_by(|a, b| a.name.cmp(&b.name));
                ArmyWithDetachments {
                    army: army.clone(),
                    detachments,
                }
            })
            .collect();
        armies.sort_by(|a, b| a.army.name.cmp(&b.army.name));
        armies
    }

    /// Add an army and its initial detachments, assigning fresh IDs.
    pub fn insert_army<S: AsRef<str>>(
        &mut self,
        name: &str,
        detachment_names: &[S],
    ) -> ArmyWithDetachments {
        let army = Army::new(name).with_id(self.next_army_id());
        self.armies.push(army.clone());

        let detachments: Vec<Detachment> = detachment_names
            .iter()
            .map(|det_name| self.insert_detachment(army.id, det_name.as_ref()))
            .collect();

        ArmyWithDetachments { army, detachments }
    }

    fn insert_detachment(&mut self, army_id: ArmyId, name: &str) -> Detachment {
        let det = Detachment::new(army_id, name).with_id(self.next_detachment_id());
        self.detachments.push(det.clone());
        det
    }

    /// Check that `id` names a detachment owned by `army_id`.
    fn owned_detachment(
        &self,
        army_id: ArmyId,
        id: DetachmentId,
    ) -> Result<&Detachment, StorageError> {
        let det = self
            .detachment(id)
            .ok_or(StorageError::DetachmentNotFound(id))?;
        if det.army_id != army_id {
            return Err(StorageError::ForeignDetachment {
                detachment: id,
                army: army_id,
            });
        }
        Ok(det)
    }

    /// Apply an army rename and its detachment write-set.
    ///
    /// Every referenced row is checked before anything is written, so an error
    /// leaves the snapshot unchanged. Returns the IDs given to new detachments.
    pub fn apply_army_update(
        &mut self,
        plan: &ArmyUpdatePlan,
    ) -> Result<Vec<DetachmentId>, StorageError> {
        self.active_army(plan.army_id)
            .ok_or(StorageError::ArmyNotFound(plan.army_id))?;
        for update in &plan.detachments.to_update {
            if self.owned_detachment(plan.army_id, update.id)?.is_deleted {
                return Err(StorageError::DetachmentNotFound(update.id));
            }
        }
        for id in &plan.detachments.to_soft_delete {
            self.owned_detachment(plan.army_id, *id)?;
        }

        self.army_mut(plan.army_id)?.name = plan.name.clone();

        for update in &plan.detachments.to_update {
            self.detachment_mut(update.id)?.name = update.name.clone();
        }
        for id in &plan.detachments.to_soft_delete {
            self.detachment_mut(*id)?.is_deleted = true;
        }

        let created = plan
            .detachments
            .to_create
            .iter()
            .map(|create| self.insert_detachment(plan.army_id, &create.name).id)
            .collect();

        Ok(created)
    }

    /// Soft-delete an army together with all of its detachments.
    /// Returns how many detachments were newly marked.
    pub fn soft_delete_army(&mut self, id: ArmyId) -> Result<usize, StorageError> {
        self.army_mut(id)?.is_deleted = true;

        let mut cascaded = 0;
        for det in self.detachments.iter_mut().filter(|d| d.army_id == id) {
            if !det.is_deleted {
                det.is_deleted = true;
                cascaded += 1;
            }
        }
        Ok(cascaded)
    }

    /// Physically remove an army, detachments first.
    /// Returns how many detachments were removed.
    pub fn hard_delete_army(&mut self, id: ArmyId) -> Result<usize, StorageError> {
        self.army(id).ok_or(StorageError::ArmyNotFound(id))?;

        let before = self.detachments.len();
        self.detachments.retain(|d| d.army_id != id);
        let removed = before - self.detachments.len();

        self.armies.retain(|a| a.id != id);
        Ok(removed)
    }

    pub fn soft_delete_detachment(&mut self, id: DetachmentId) -> Result<(), StorageError> {
        self.detachment_mut(id)?.is_deleted = true;
        Ok(())
    }

    /// Rename an active detachment of an active army.
    pub fn rename_detachment(&mut self, id: DetachmentId, name: &str) -> Result<(), StorageError> {
        let active = self
            .detachment(id)
            .filter(|d| !d.is_deleted && self.active_army(d.army_id).is_some())
            .is_some();
        if !active {
            return Err(StorageError::DetachmentNotFound(id));
        }
        self.detachment_mut(id)?.name = name.to_string();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Matches that reference an army or any detachment it owns.
    pub fn matches_referencing_army(&self, army_id: ArmyId) -> usize {
        let owned: HashSet<DetachmentId> = self
            .detachments
            .iter()
            .filter(|d| d.army_id == army_id)
            .map(|d| d.id)
            .collect();

        self.matches
            .iter()
            .filter(|m| {
                m.army_ids().contains(&army_id)
                    || m.detachment_ids().iter().any(|d| owned.contains(d))
            })
            .count()
    }

    /// Check that every army and detachment a match names exists and that each
    /// detachment belongs to the army on its side.
    pub fn check_match_refs(&self, m: &Match) -> Result<(), StorageError> {
        for (army_id, det_id) in [
            (m.user_army_id, m.user_detachment_id),
            (m.opponent_army_id, m.opponent_detachment_id),
        ] {
            self.army(army_id).ok_or(StorageError::ArmyNotFound(army_id))?;
            self.owned_detachment(army_id, det_id)?;
        }
        Ok(())
    }

    /// Store a new match under a fresh ID and return it.
    pub fn insert_match(&mut self, m: Match) -> MatchId {
        let id = self.next_match_id();
        self.matches.push(m.with_id(id));
        id
    }

    /// Overwrite the stored match with the same ID.
    pub fn replace_match(&mut self, m: Match) -> Result<(), StorageError> {
        let slot = self
            .matches
            .iter_mut()
            .find(|existing| existing.id == m.id)
            .ok_or(StorageError::MatchNotFound(m.id))?;
        *slot = m;
        Ok(())
    }

    pub fn remove_match(&mut self, id: MatchId) -> Result<Match, StorageError> {
        let pos = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or(StorageError::MatchNotFound(id))?;
        Ok(self.matches.remove(pos))
    }

    /// Join a match with its army and detachment names.
    ///
    /// Soft-deleted rows still resolve. Returns `None` only when a referenced
    /// row is missing entirely.
    pub fn resolve(&self, m: &Match) -> Option<ResolvedMatch> {
        let army = |id| self.army(id).map(|a| NamedRef::new(a.id, a.name.clone()));
        let det = |id| self.detachment(id).map(|d| NamedRef::new(d.id, d.name.clone()));

        Some(ResolvedMatch {
            id: m.id,
            date: m.date.format("%Y-%m-%d").to_string(),
            is_tournament: m.is_tournament,
            tournament_name: m.tournament_name.clone(),
            user_score: m.user_score,
            opponent_score: m.opponent_score,
            user_wtc_score: m.user_wtc_score,
            opponent_wtc_score: m.opponent_wtc_score,
            user_army: army(m.user_army_id)?,
            user_detachment: det(m.user_detachment_id)?,
            opponent_army: army(m.opponent_army_id)?,
            opponent_detachment: det(m.opponent_detachment_id)?,
        })
    }

    /// Every match that resolves, in storage order.
    pub fn resolved_matches(&self) -> Vec<ResolvedMatch> {
        self.matches
            .iter()
            .filter_map(|m| {
                let resolved = self.resolve(m);
                if resolved.is_none() {
                    warn!(match_id = %m.id, "Skipping match with dangling references");
                }
                resolved
            })
            .collect()
    }
}
