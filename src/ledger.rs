//! Ledger service.
//!
//! Composes the pure core (reconcile, scoring, filter, calculate) with a
//! [`LedgerStore`]. Every write path loads a snapshot, mutates its own copy and
//! commits it whole, so parent and child writes land together or not at all.
//!
//! There is no version check between load and commit. Two edits planned from
//! the same snapshot will both apply, and the later one wins field by field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculate::{aggregate, MatchStatistics};
use crate::filter::{filter_matches, FilterError, FilterOptions, FilterSpec, SortOption};
use crate::models::{
    ArmyId, ArmyWithDetachments, Detachment, DetachmentId, Match, MatchId, ResolvedMatch, Side,
};
use crate::reconcile::{plan_army_update, ArmyEdit, ArmyUpdatePlan, ReconcileError};
use crate::storage::{LedgerSnapshot, LedgerStore, StorageError};

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(StorageError),

    #[error("Invalid army edit: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Army {0} not found")]
    ArmyNotFound(ArmyId),

    #[error("Detachment {0} not found")]
    DetachmentNotFound(DetachmentId),

    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    #[error("Invalid match: {0}")]
    InvalidMatch(String),

    #[error("Army {army} is referenced by {matches} match(es); soft-delete it instead")]
    ArmyInUse { army: ArmyId, matches: usize },
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ArmyNotFound(id) => LedgerError::ArmyNotFound(id),
            StorageError::DetachmentNotFound(id) => LedgerError::DetachmentNotFound(id),
            StorageError::MatchNotFound(id) => LedgerError::MatchNotFound(id),
            other => LedgerError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// A match as submitted by the caller. WTC scores are never part of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInput {
    pub date: NaiveDate,
    pub user: Side,
    pub opponent: Side,
    pub user_score: i32,
    pub opponent_score: i32,
    #[serde(default)]
    pub is_tournament: bool,
    #[serde(default)]
    pub tournament_name: Option<String>,
}

impl MatchInput {
    fn into_match(self) -> Match {
        Match::new(
            self.date,
            self.user,
            self.opponent,
            self.user_score,
            self.opponent_score,
        )
        .with_tournament(self.is_tournament, self.tournament_name)
    }
}

/// Match history service over a store.
pub struct Ledger<S> {
    store: S,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` against a fresh copy of the state and commit only if it succeeds.
    fn write<T>(&self, f: impl FnOnce(&mut LedgerSnapshot) -> Result<T>) -> Result<T> {
        let mut snapshot = self.store.load()?;
        let out = f(&mut snapshot)?;
        self.store.commit(&snapshot)?;
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Armies
    // ------------------------------------------------------------------

    pub fn create_army<N: AsRef<str>>(
        &self,
        name: &str,
        detachment_names: &[N],
    ) -> Result<ArmyWithDetachments> {
        let created = self.write(|snap| Ok(snap.insert_army(name, detachment_names)))?;
        info!(
            army_id = %created.army.id,
            detachments = created.detachments.len(),
            "Created army {}", created.army.name
        );
        Ok(created)
    }

    /// Active armies with their active detachments, both sorted by name.
    pub fn list_armies(&self) -> Result<Vec<ArmyWithDetachments>> {
        Ok(self.store.load()?.active_armies())
    }

    /// An army with every detachment it has owned, deleted ones included.
    pub fn army(&self, id: ArmyId) -> Result<ArmyWithDetachments> {
        let snap = self.store.load()?;
        let army = snap.army(id).ok_or(LedgerError::ArmyNotFound(id))?.clone();
        let mut detachments = snap.detachments_of(id);
        detachments.sort_by_key(|d| d.id);
        Ok(ArmyWithDetachments { army, detachments })
    }

    /// Active detachments of an army, name descending.
    pub fn detachments_for_army(&self, army_id: ArmyId) -> Result<Vec<Detachment>> {
        let snap = self.store.load()?;
        snap.army(army_id)
            .ok_or(LedgerError::ArmyNotFound(army_id))?;
        let mut detachments = snap.active_detachments(army_id);
        detachments.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(detachments)
    }

    /// Work out what an edit would write, without writing it.
    pub fn plan_army_update(&self, id: ArmyId, edit: &ArmyEdit) -> Result<ArmyUpdatePlan> {
        plan_against(&self.store.load()?, id, edit)
    }

    /// Commit a previously computed plan as one unit.
    pub fn apply_army_update(&self, plan: &ArmyUpdatePlan) -> Result<ArmyWithDetachments> {
        let created = self.write(|snap| Ok(snap.apply_army_update(plan)?))?;
        info!(
            army_id = %plan.army_id,
            updated = plan.detachments.to_update.len(),
            created = created.len(),
            soft_deleted = plan.detachments.to_soft_delete.len(),
            "Applied army update"
        );
        self.listing(plan.army_id)
    }

    /// Plan and apply an edit against the same snapshot.
    pub fn update_army(&self, id: ArmyId, edit: &ArmyEdit) -> Result<ArmyWithDetachments> {
        let plan = self.write(|snap| {
            let plan = plan_against(snap, id, edit)?;
            snap.apply_army_update(&plan)?;
            Ok(plan)
        })?;
        info!(
            army_id = %id,
            updated = plan.detachments.to_update.len(),
            created = plan.detachments.to_create.len(),
            soft_deleted = plan.detachments.to_soft_delete.len(),
            "Updated army"
        );
        self.listing(id)
    }

    fn listing(&self, id: ArmyId) -> Result<ArmyWithDetachments> {
        let snap = self.store.load()?;
        let army = snap.army(id).ok_or(LedgerError::ArmyNotFound(id))?.clone();
        let mut detachments = snap.active_detachments(id);
        detachments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ArmyWithDetachments { army, detachments })
    }

    /// Soft-delete an army and every detachment it owns.
    pub fn soft_delete_army(&self, id: ArmyId) -> Result<()> {
        let cascaded = self.write(|snap| Ok(snap.soft_delete_army(id)?))?;
        info!(army_id = %id, detachments = cascaded, "Soft-deleted army");
        Ok(())
    }

    /// Physically remove an army and its detachments. Refused while any match
    /// still points at them.
    pub fn hard_delete_army(&self, id: ArmyId) -> Result<()> {
        let removed = self.write(|snap| {
            snap.army(id).ok_or(LedgerError::ArmyNotFound(id))?;
            let matches = snap.matches_referencing_army(id);
            if matches > 0 {
                return Err(LedgerError::ArmyInUse { army: id, matches });
            }
            Ok(snap.hard_delete_army(id)?)
        })?;
        info!(army_id = %id, detachments = removed, "Hard-deleted army");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Detachments
    // ------------------------------------------------------------------

    pub fn soft_delete_detachment(&self, id: DetachmentId) -> Result<()> {
        self.write(|snap| Ok(snap.soft_delete_detachment(id)?))?;
        info!(detachment_id = %id, "Soft-deleted detachment");
        Ok(())
    }

    pub fn rename_detachment(&self, id: DetachmentId, name: &str) -> Result<()> {
        self.write(|snap| Ok(snap.rename_detachment(id, name)?))?;
        info!(detachment_id = %id, "Renamed detachment to {}", name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Store a new match with derived WTC scores.
    pub fn record_match(&self, input: MatchInput) -> Result<ResolvedMatch> {
        let resolved = self.write(|snap| {
            let m = input.into_match();
            validate_refs(snap, &m)?;
            let id = snap.insert_match(m);
            resolve_stored(snap, id)
        })?;
        info!(
            match_id = %resolved.id,
            user_wtc = resolved.user_wtc_score,
            opponent_wtc = resolved.opponent_wtc_score,
            "Recorded match"
        );
        Ok(resolved)
    }

    /// Replace a stored match. WTC scores are re-derived from the new input.
    pub fn edit_match(&self, id: MatchId, input: MatchInput) -> Result<ResolvedMatch> {
        let resolved = self.write(|snap| {
            snap.match_by_id(id).ok_or(LedgerError::MatchNotFound(id))?;
            let m = input.into_match().with_id(id);
            validate_refs(snap, &m)?;
            snap.replace_match(m)?;
            resolve_stored(snap, id)
        })?;
        info!(match_id = %id, "Edited match");
        Ok(resolved)
    }

    pub fn delete_match(&self, id: MatchId) -> Result<()> {
        self.write(|snap| Ok(snap.remove_match(id)?))?;
        info!(match_id = %id, "Deleted match");
        Ok(())
    }

    /// All resolvable matches in the requested order.
    pub fn match_history(&self, sort: SortOption) -> Result<Vec<ResolvedMatch>> {
        let mut matches = self.store.load()?.resolved_matches();
        sort.sort(&mut matches);
        debug!(count = matches.len(), sort = %sort, "Loaded match history");
        Ok(matches)
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Filter the history and fold it into statistics.
    pub fn statistics(&self, spec: &FilterSpec, use_wtc: bool) -> Result<MatchStatistics> {
        let matches = self.store.load()?.resolved_matches();
        let kept = filter_matches(&matches, spec)?;
        debug!(total = matches.len(), kept = kept.len(), use_wtc, "Filtered matches");
        Ok(aggregate(&kept, use_wtc)?)
    }

    /// Dropdown values for the filter panel given the current selection.
    pub fn filter_options(&self, current: &FilterSpec) -> Result<FilterOptions> {
        let matches = self.store.load()?.resolved_matches();
        Ok(FilterOptions::collect(&matches, current)?)
    }
}

fn plan_against(snap: &LedgerSnapshot, id: ArmyId, edit: &ArmyEdit) -> Result<ArmyUpdatePlan> {
    let army = snap.active_army(id).ok_or(LedgerError::ArmyNotFound(id))?;
    let existing = snap.active_detachments(id);
    Ok(plan_army_update(army, &existing, edit)?)
}

fn validate_refs(snap: &LedgerSnapshot, m: &Match) -> Result<()> {
    snap.check_match_refs(m)
        .map_err(|e| LedgerError::InvalidMatch(e.to_string()))
}

fn resolve_stored(snap: &LedgerSnapshot, id: MatchId) -> Result<ResolvedMatch> {
    snap.match_by_id(id)
        .and_then(|m| snap.resolve(m))
        .ok_or_else(|| LedgerError::InvalidMatch(format!("match {} does not resolve", id)))
}
